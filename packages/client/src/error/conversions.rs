use super::types::{CertError, DecodeError};

impl From<der::Error> for DecodeError {
    fn from(e: der::Error) -> Self {
        let context = e
            .position()
            .map(|position| format!("@{position}"))
            .unwrap_or_default();
        DecodeError::new(context, e.kind().to_string())
    }
}

impl From<const_oid::Error> for DecodeError {
    fn from(e: const_oid::Error) -> Self {
        DecodeError::new("", format!("invalid object identifier: {e}"))
    }
}

impl From<der::Error> for CertError {
    fn from(e: der::Error) -> Self {
        CertError::Decode(e.into())
    }
}

impl From<pem::PemError> for CertError {
    fn from(e: pem::PemError) -> Self {
        CertError::Decode(DecodeError::new("PEM", e.to_string()))
    }
}

impl From<rcgen::Error> for CertError {
    fn from(e: rcgen::Error) -> Self {
        CertError::Encode(e.to_string())
    }
}

impl From<reqwest::Error> for CertError {
    fn from(e: reqwest::Error) -> Self {
        CertError::Network(e.to_string())
    }
}

impl From<rustls::Error> for CertError {
    fn from(e: rustls::Error) -> Self {
        CertError::Tls(e.to_string())
    }
}
