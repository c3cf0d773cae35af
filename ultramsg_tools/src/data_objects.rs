use serde::{Deserialize, Serialize};

/// A transport-ready WhatsApp message. `to` is a phone number in international format (`+57…`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppMessage {
    pub to: String,
    pub body: String,
    /// When present, the message is sent as an image with `body` as the caption.
    pub image: Option<String>,
}

impl WhatsAppMessage {
    pub fn text<T: Into<String>, B: Into<String>>(to: T, body: B) -> Self {
        Self { to: to.into(), body: body.into(), image: None }
    }

    pub fn with_image<T: Into<String>, B: Into<String>, I: Into<String>>(to: T, body: B, image: I) -> Self {
        Self { to: to.into(), body: body.into(), image: Some(image.into()) }
    }
}
