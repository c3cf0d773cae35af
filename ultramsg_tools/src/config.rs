use log::*;
use notify_common::Secret;

pub const DEFAULT_API_URL: &str = "https://api.ultramsg.com";

#[derive(Debug, Clone)]
pub struct UltraMsgConfig {
    /// The UltraMsg instance identifier, e.g. "instance12345".
    pub instance_id: String,
    /// The API token for the instance. UltraMsg expects this as a request parameter, not a header.
    pub token: Secret<String>,
    pub api_url: String,
}

impl Default for UltraMsgConfig {
    fn default() -> Self {
        Self { instance_id: String::default(), token: Secret::default(), api_url: DEFAULT_API_URL.to_string() }
    }
}

impl UltraMsgConfig {
    pub fn new_from_env_or_default() -> Self {
        let instance_id = std::env::var("ONS_ULTRAMSG_INSTANCE_ID").unwrap_or_else(|_| {
            error!("🪛️ ONS_ULTRAMSG_INSTANCE_ID is not set. Outbound WhatsApp messages will be rejected.");
            String::default()
        });
        let token = Secret::new(std::env::var("ONS_ULTRAMSG_TOKEN").unwrap_or_else(|_| {
            error!("🪛️ ONS_ULTRAMSG_TOKEN is not set. Outbound WhatsApp messages will be rejected.");
            String::default()
        }));
        let api_url = std::env::var("ONS_ULTRAMSG_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self { instance_id, token, api_url }
    }
}
