//! A thin client for the UltraMsg WhatsApp gateway API.
//!
//! UltraMsg exposes an instance-scoped REST API for sending WhatsApp messages. This crate wraps the two
//! endpoints the notifier needs (`messages/chat` and `messages/image`) plus an instance status check, and
//! defines the [`WhatsAppSender`] trait so that server code can be written (and tested) against the sending
//! behaviour rather than the concrete HTTP client.

pub mod api;
pub mod config;
pub mod data_objects;
pub mod error;
pub mod traits;

pub use api::UltraMsgApi;
pub use config::UltraMsgConfig;
pub use data_objects::WhatsAppMessage;
pub use error::UltraMsgApiError;
pub use traits::WhatsAppSender;
