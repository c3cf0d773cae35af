use serde_json::Value;

use crate::UltraMsgApiError;

/// Behaviour for dispatching WhatsApp messages to a gateway.
///
/// The server's webhook handlers are generic over this trait so that endpoint tests can substitute a mock
/// and assert on exactly which messages were (or were not) sent.
#[allow(async_fn_in_trait)]
pub trait WhatsAppSender {
    /// Send a plain text message. Returns the gateway's raw JSON receipt.
    async fn send_text(&self, to: &str, body: &str) -> Result<Value, UltraMsgApiError>;
    /// Send an image message with a caption. Returns the gateway's raw JSON receipt.
    async fn send_image(&self, to: &str, image_url: &str, caption: &str) -> Result<Value, UltraMsgApiError>;
}
