use mockall::mock;
use serde_json::Value;
use ultramsg_tools::{UltraMsgApiError, WhatsAppSender};

mock! {
    pub Sender {}
    impl WhatsAppSender for Sender {
        async fn send_text(&self, to: &str, body: &str) -> Result<Value, UltraMsgApiError>;
        async fn send_image(&self, to: &str, image_url: &str, caption: &str) -> Result<Value, UltraMsgApiError>;
    }
}
