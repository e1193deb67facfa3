use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type KeylessResult<T> = Result<T, KeylessError>;

#[derive(Debug, thiserror::Error)]
pub enum KeylessError {
    #[error("unsupported hash function: {0}")]
    UnsupportedHash(String),
    #[error("not support hash func: unknown hash code {0}")]
    UnknownHashCode(u64),
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),
    #[error("input must be hashed message: expected {expected} bytes, got {actual}")]
    InvalidInput { expected: usize, actual: usize },
    #[error("signing request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decode error: {0}")]
    Decode(#[from] hex::FromHexError),
    #[error("sign error: {0}")]
    SignOperation(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse body error: {0}")]
    MalformedRequest(String),
    #[error("no certificate found in {0}")]
    NoCertificateFound(String),
    #[error("failed to parse key: {0}")]
    KeyParse(String),
    #[error("unsupported key format {0:?}")]
    UnsupportedKeyFormat(String),
    #[error("malformed PEM: {0}")]
    Pem(String),
    #[error("signing service answered {status}: {body}")]
    RemoteRejected { status: u16, body: String },
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<rustls_pki_types::pem::Error> for KeylessError {
    fn from(error: rustls_pki_types::pem::Error) -> Self {
        match error {
            rustls_pki_types::pem::Error::Io(io) => Self::Io(io),
            other => Self::Pem(format!("{other:?}")),
        }
    }
}

impl KeylessError {
    /// Status code reported to a signing client.
    ///
    /// Only malformed or unsupported input is a client error; I/O and
    /// cryptographic failures are reported as server errors.
    pub fn status_code(&self) -> StatusCode {
        match self {
            KeylessError::UnknownHashCode(_)
            | KeylessError::Decode(_)
            | KeylessError::UnsupportedHash(_)
            | KeylessError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failures are plain text; the wire protocol carries no error schema.
impl IntoResponse for KeylessError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_hash_code_returns_400() {
        let response = KeylessError::UnknownHashCode(99).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn decode_error_returns_400() {
        let error = hex::decode("zz").unwrap_err();
        let response = KeylessError::from(error).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_request_returns_500() {
        let response = KeylessError::MalformedRequest("eof".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn sign_operation_failure_returns_500() {
        let response = KeylessError::SignOperation("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn io_failure_returns_500() {
        let error = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let response = KeylessError::from(error).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_input_message_names_both_lengths() {
        let error = KeylessError::InvalidInput { expected: 32, actual: 31 };
        assert_eq!(
            error.to_string(),
            "input must be hashed message: expected 32 bytes, got 31"
        );
    }
}
