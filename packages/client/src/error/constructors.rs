use super::types::{CertError, DecodeError};

impl CertError {
    pub fn password_required(resource: impl Into<String>) -> Self {
        CertError::PasswordRequired {
            resource: resource.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        CertError::NotFound(what.into())
    }

    pub fn invalid_argument(what: impl Into<String>) -> Self {
        CertError::InvalidArgument(what.into())
    }

    pub fn encode(what: impl std::fmt::Display) -> Self {
        CertError::Encode(what.to_string())
    }

    pub fn decode(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        CertError::Decode(DecodeError::new(context, message.to_string()))
    }
}

impl DecodeError {
    /// Decode error for an unexpected tag.
    pub fn unexpected_tag(context: impl Into<String>, expected: impl std::fmt::Display, actual: impl std::fmt::Display) -> Self {
        DecodeError::new(context, format!("expected {expected}, got {actual}"))
    }
}
