//! DER encoded single object files

use std::io::{Read, Write};

use crate::certs::objects::{CertObject, CertObjectStore};
use crate::certs::password::PasswordCallback;
use crate::error::{CertError, Result};

use super::alias_from_resource;
use super::provider::{CertProvider, CertReader, CertWriter, ReadOutcome};

/// Reads and writes one DER encoded object per file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerProvider;

type Sniffer = fn(&[u8]) -> Result<CertObject>;

// Most specific structures first.
const SNIFFERS: &[Sniffer] = &[
    CertObject::crt_from_der,
    CertObject::csr_from_der,
    CertObject::crl_from_der,
    CertObject::encrypted_key_from_der,
    CertObject::key_from_pkcs8_der,
];

impl DerProvider {
    pub const NAME: &'static str = "DER";

    fn sniff(data: &[u8]) -> Option<CertObject> {
        SNIFFERS.iter().find_map(|sniff| sniff(data).ok())
    }
}

impl CertProvider for DerProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn file_patterns(&self) -> &'static [&'static str] {
        &["*.der", "*.cer", "*.crt", "*.csr", "*.crl", "*.p8"]
    }

    fn file_type(&self) -> &'static str {
        "DER encoded file"
    }

    fn file_extension(&self) -> &'static str {
        ".der"
    }

    fn is_encryption_supported(&self) -> bool {
        false
    }

    fn is_text(&self) -> bool {
        false
    }
}

impl CertReader for DerProvider {
    fn read_binary(
        &self,
        input: &mut dyn Read,
        resource: &str,
        _password: &dyn PasswordCallback,
    ) -> Result<ReadOutcome> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;

        // not a single DER element at all
        if crate::asn1::decode_any(&data).is_err() {
            return Ok(ReadOutcome::NotRecognized);
        }

        match Self::sniff(&data) {
            Some(object) => {
                let mut store = CertObjectStore::new();
                store.add(alias_from_resource(resource), object)?;
                Ok(ReadOutcome::Recognized(store))
            }
            None => Ok(ReadOutcome::NotRecognized),
        }
    }
}

impl CertWriter for DerProvider {
    fn write_binary(&self, output: &mut dyn Write, store: &CertObjectStore, resource: &str) -> Result<()> {
        let mut entries = store.iter();

        let (Some(entry), None) = (entries.next(), entries.next()) else {
            return Err(CertError::invalid_argument(format!(
                "{} holds {} objects, DER files hold exactly one",
                resource,
                store.len()
            )));
        };
        output.write_all(&entry.object().to_der()?)?;
        Ok(())
    }

    fn write_encrypted_binary(
        &self,
        _output: &mut dyn Write,
        _store: &CertObjectStore,
        resource: &str,
        _new_password: &str,
    ) -> Result<()> {
        Err(CertError::invalid_argument(format!(
            "DER format does not support encryption ({resource})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certs::objects::CertObjectKind;
    use crate::certs::password::NoPassword;

    #[test]
    fn test_sniffs_certificate() {
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let cert = rcgen::CertificateParams::new(vec!["example.org".to_string()])
            .unwrap()
            .self_signed(&key_pair)
            .unwrap();

        let der = cert.der().to_vec();
        let outcome = DerProvider
            .read_binary(&mut der.as_slice(), "server.cer", &NoPassword)
            .unwrap();
        let store = outcome.into_store().unwrap();

        assert!(store.get("server", CertObjectKind::Crt).is_some());
    }

    #[test]
    fn test_sniffs_key() {
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let der = key_pair.serialize_der();

        let store = DerProvider
            .read_binary(&mut der.as_slice(), "server.p8", &NoPassword)
            .unwrap()
            .into_store()
            .unwrap();

        assert!(store.get("server", CertObjectKind::Key).is_some());
    }

    #[test]
    fn test_text_is_not_recognized() {
        let outcome = DerProvider
            .read_binary(&mut b"-----BEGIN CERTIFICATE-----".as_slice(), "server.pem", &NoPassword)
            .unwrap();

        assert_eq!(outcome, ReadOutcome::NotRecognized);
    }

    #[test]
    fn test_write_requires_single_object() {
        let store = CertObjectStore::new();
        let mut output = Vec::new();

        assert!(DerProvider.write_binary(&mut output, &store, "empty.der").is_err());
    }
}
