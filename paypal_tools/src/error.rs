use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayPalApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not send request to PayPal: {0}")]
    RequestError(String),
    #[error("Invalid response from PayPal: {0}")]
    ResponseError(String),
    #[error("PayPal returned an error. Status {status}. {message}")]
    QueryError { status: u16, message: String },
}
