//! Engine error taxonomy
//!
//! Decode failures are kept apart from the remaining engine errors so that
//! codec code can report positional context without pulling in I/O concerns.

/// `Result` alias used throughout the engine.
pub type Result<T> = std::result::Result<T, CertError>;

/// Malformed ASN.1 data, tag mismatch or unexpected structure.
///
/// The `context` names the position of the failure as a path, for example
/// `CRLDistributionPoints[1].distributionPoint.fullName[0]`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("decode error{}: {message}", location(.context))]
pub struct DecodeError {
    context: String,
    message: String,
}

impl DecodeError {
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
        }
    }

    /// The position at which decoding failed.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prefix the context with an enclosing position.
    #[must_use]
    pub fn within(mut self, outer: &str) -> Self {
        self.context = if self.context.is_empty() {
            outer.to_string()
        } else if self.context.starts_with('[') {
            format!("{outer}{}", self.context)
        } else {
            format!("{outer}.{}", self.context)
        };
        self
    }
}

fn location(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!(" at {context}")
    }
}

/// Engine-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("password required to access {resource}")]
    PasswordRequired { resource: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("encoding failed: {0}")]
    Encode(String),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("network error: {0}")]
    Network(String),
}
