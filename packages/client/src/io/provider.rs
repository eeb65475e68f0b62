//! Codec provider contracts

use std::io::{Read, Write};

use crate::certs::objects::CertObjectStore;
use crate::certs::password::PasswordCallback;
use crate::error::{CertError, Result};

/// Outcome of a trial decode.
///
/// `Err(..)` from a reader means the format matched but the data is corrupt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Recognized(CertObjectStore),
    NotRecognized,
}

impl ReadOutcome {
    /// Recognized only when at least one object was decoded.
    #[must_use]
    pub fn from_store(store: CertObjectStore) -> Self {
        if store.is_empty() {
            ReadOutcome::NotRecognized
        } else {
            ReadOutcome::Recognized(store)
        }
    }

    #[must_use]
    pub fn into_store(self) -> Option<CertObjectStore> {
        match self {
            ReadOutcome::Recognized(store) => Some(store),
            ReadOutcome::NotRecognized => None,
        }
    }
}

/// Common provider description.
pub trait CertProvider: Send + Sync {
    /// Display name, also used for lookups.
    fn name(&self) -> &'static str;

    /// File name glob patterns, e.g. `*.pem`.
    fn file_patterns(&self) -> &'static [&'static str];

    /// Short label of the file type.
    fn file_type(&self) -> &'static str;

    /// Default file extension including the dot.
    fn file_extension(&self) -> &'static str;

    fn is_encryption_supported(&self) -> bool;

    /// Whether the written form is text.
    fn is_text(&self) -> bool;
}

/// Decoder for one file format.
pub trait CertReader: CertProvider {
    fn read_binary(
        &self,
        input: &mut dyn Read,
        resource: &str,
        password: &dyn PasswordCallback,
    ) -> Result<ReadOutcome>;

    fn read_string(&self, data: &str, resource: &str, password: &dyn PasswordCallback) -> Result<ReadOutcome> {
        self.read_binary(&mut data.as_bytes(), resource, password)
    }
}

/// Encoder for one file format.
pub trait CertWriter: CertProvider {
    fn write_binary(&self, output: &mut dyn Write, store: &CertObjectStore, resource: &str) -> Result<()>;

    /// Write with private keys encrypted under a freshly supplied password.
    fn write_encrypted_binary(
        &self,
        output: &mut dyn Write,
        store: &CertObjectStore,
        resource: &str,
        new_password: &str,
    ) -> Result<()>;

    fn write_string(&self, store: &CertObjectStore, resource: &str) -> Result<String> {
        let mut buffer = Vec::new();

        self.write_binary(&mut buffer, store, resource)?;
        text_output(self.name(), buffer)
    }

    fn write_encrypted_string(&self, store: &CertObjectStore, resource: &str, new_password: &str) -> Result<String> {
        let mut buffer = Vec::new();

        self.write_encrypted_binary(&mut buffer, store, resource, new_password)?;
        text_output(self.name(), buffer)
    }
}

fn text_output(provider: &str, buffer: Vec<u8>) -> Result<String> {
    String::from_utf8(buffer)
        .map_err(|_| CertError::invalid_argument(format!("{provider} does not produce text output")))
}
