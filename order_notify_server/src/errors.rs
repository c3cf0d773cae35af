use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    /// The request body was not parseable JSON. Surfaced as a 500 so the platform retries the whole
    /// webhook; nothing has been marked processed at that point.
    #[error("Could not deserialize the webhook payload. {0}")]
    CouldNotDeserializePayload(String),
    /// The payload parsed but is not a usable event (no identifier, no line items).
    #[error("Invalid webhook payload. {0}")]
    InvalidEvent(String),
    #[error("Invalid request body. {0}")]
    InvalidRequestBody(String),
    #[error("Webhook signature rejected. {0}")]
    SignatureRejected(#[from] SignatureError),
    #[error("Could not deliver the message. {0}")]
    DeliveryFailed(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Unspecified error. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidEvent(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::SignatureRejected(_) => StatusCode::UNAUTHORIZED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotDeserializePayload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DeliveryFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SignatureError {
    #[error("No HMAC signature header found in the request.")]
    MissingSignature,
    #[error("The HMAC signature does not match the request body.")]
    InvalidSignature,
}
