use thiserror::Error;

#[derive(Debug, Error)]
pub enum UltraMsgApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the UltraMsg gateway: {0}")]
    RequestError(String),
    #[error("Could not deserialize the gateway response: {0}")]
    JsonError(String),
    #[error("Gateway rejected the message. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}
