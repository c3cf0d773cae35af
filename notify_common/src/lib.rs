mod price;
mod secret;

pub mod helpers;

pub use price::format_price;
pub use secret::Secret;
