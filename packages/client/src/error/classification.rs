use std::io;

use super::types::CertError;

impl CertError {
    /// Returns true if the operation failed for lack of a (valid) password.
    ///
    /// Callers are expected to re-prompt in this case.
    #[must_use]
    pub fn is_password_required(&self) -> bool {
        matches!(self, CertError::PasswordRequired { .. })
    }

    /// Returns true if the requested object or data was not found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            CertError::NotFound(_) => true,
            CertError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Returns true if the error stems from malformed input data.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, CertError::Decode(_))
    }

    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, CertError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[test]
    fn test_classification() {
        assert!(CertError::password_required("key.pem").is_password_required());
        assert!(CertError::not_found("public key").is_not_found());
        assert!(CertError::from(io::Error::from(io::ErrorKind::NotFound)).is_not_found());
        assert!(!CertError::from(io::Error::from(io::ErrorKind::PermissionDenied)).is_not_found());
        assert!(CertError::from(DecodeError::new("", "bad tag")).is_decode());
    }

    #[test]
    fn test_decode_error_context_nesting() {
        let err = DecodeError::new("", "unexpected tag")
            .within("[1]")
            .within("fullName")
            .within("CRLDistributionPoints[0]");

        assert_eq!(err.context(), "CRLDistributionPoints[0].fullName[1]");
        assert_eq!(
            err.to_string(),
            "decode error at CRLDistributionPoints[0].fullName[1]: unexpected tag"
        );
    }

    #[test]
    fn test_decode_error_without_context() {
        let err = DecodeError::new("", "truncated data");

        assert_eq!(err.to_string(), "decode error: truncated data");
        assert_eq!(CertError::from(err).to_string(), "decode error: truncated data");
    }
}
