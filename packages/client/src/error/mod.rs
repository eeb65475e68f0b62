pub mod classification;
pub mod constructors;
pub mod conversions;
pub mod types;

pub use types::{CertError, DecodeError, Result};

/// Result alias for ASN.1 decode/encode operations.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
