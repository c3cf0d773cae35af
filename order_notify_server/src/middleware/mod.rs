mod hmac;

pub use hmac::{HmacMiddlewareFactory, SHOPIFY_HMAC_HEADER};
