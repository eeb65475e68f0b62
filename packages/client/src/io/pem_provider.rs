//! PEM encoded certificate objects

use std::io::{Read, Write};

use der::Encode;
use x509_cert::name::Name;

use crate::certs::objects::{CertObject, CertObjectStore, StoredKey, PEM_PRIVATE_KEY};
use crate::certs::password::PasswordCallback;
use crate::error::Result;

use super::alias_from_resource;
use super::provider::{CertProvider, CertReader, CertWriter, ReadOutcome};

const PEM_CERTIFICATE: &str = "CERTIFICATE";
const PEM_X509_CERTIFICATE: &str = "X509 CERTIFICATE";
const PEM_CERTIFICATE_REQUEST: &str = "CERTIFICATE REQUEST";
const PEM_NEW_CERTIFICATE_REQUEST: &str = "NEW CERTIFICATE REQUEST";
const PEM_CRL: &str = "X509 CRL";
const PEM_ENCRYPTED_PRIVATE_KEY: &str = "ENCRYPTED PRIVATE KEY";

/// Reads and writes PEM files holding any number of objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct PemProvider;

impl PemProvider {
    pub const NAME: &'static str = "PEM";

    fn decode_block(block: &pem::Pem) -> Result<Option<CertObject>> {
        let object = match block.tag() {
            PEM_CERTIFICATE | PEM_X509_CERTIFICATE => CertObject::crt_from_der(block.contents())?,
            PEM_CERTIFICATE_REQUEST | PEM_NEW_CERTIFICATE_REQUEST => CertObject::csr_from_der(block.contents())?,
            PEM_CRL => CertObject::crl_from_der(block.contents())?,
            PEM_PRIVATE_KEY => CertObject::key_from_pkcs8_der(block.contents())?,
            PEM_ENCRYPTED_PRIVATE_KEY => CertObject::encrypted_key_from_der(block.contents())?,
            other => {
                tracing::debug!("Skipping unsupported PEM block '{}'", other);
                return Ok(None);
            }
        };
        Ok(Some(object))
    }

    fn encode_object(object: &CertObject, new_password: Option<&str>) -> Result<pem::Pem> {
        let block = match (object, new_password) {
            (CertObject::Crt(crt), _) => pem::Pem::new(PEM_CERTIFICATE, crt.to_der()?),
            (CertObject::Csr(csr), _) => pem::Pem::new(PEM_CERTIFICATE_REQUEST, csr.to_der()?),
            (CertObject::Crl(crl), _) => pem::Pem::new(PEM_CRL, crl.to_der()?),
            (CertObject::Key(StoredKey::Plain(key)), None) => pem::Pem::new(PEM_PRIVATE_KEY, key.pkcs8_der().to_vec()),
            (CertObject::Key(StoredKey::Plain(key)), Some(password)) => {
                pem::Pem::new(PEM_ENCRYPTED_PRIVATE_KEY, key.encrypt(password)?.as_der().to_vec())
            }
            (CertObject::Key(StoredKey::Encrypted(key)), _) => {
                pem::Pem::new(PEM_ENCRYPTED_PRIVATE_KEY, key.as_der().to_vec())
            }
        };
        Ok(block)
    }

    fn write(&self, output: &mut dyn Write, store: &CertObjectStore, new_password: Option<&str>) -> Result<()> {
        let blocks = store
            .iter()
            .map(|entry| Self::encode_object(entry.object(), new_password))
            .collect::<Result<Vec<_>>>()?;

        output.write_all(pem::encode_many(&blocks).as_bytes())?;
        Ok(())
    }
}

/// Objects of one identity while grouping a PEM file.
#[derive(Default)]
struct PemGroup {
    public_key: Option<Vec<u8>>,
    subject: Option<Name>,
    objects: Vec<CertObject>,
}

impl PemGroup {
    fn holds(&self, object: &CertObject) -> bool {
        self.objects.iter().any(|held| held.kind() == object.kind())
    }
}

/// Group objects into identities: by public key, CRLs by issuer name,
/// encrypted keys to the only identity lacking a key.
fn group_objects(objects: Vec<CertObject>) -> Vec<PemGroup> {
    let mut groups: Vec<PemGroup> = Vec::new();
    let (keyed, unkeyed): (Vec<_>, Vec<_>) = objects
        .into_iter()
        .partition(|object| object.public_key_der().is_some());

    for object in keyed {
        let public_key = object.public_key_der();
        let subject = match &object {
            CertObject::Crt(crt) => Some(crt.tbs_certificate.subject.clone()),
            _ => None,
        };
        let existing = groups
            .iter_mut()
            .find(|group| group.public_key == public_key && !group.holds(&object));

        match existing {
            Some(group) => {
                if group.subject.is_none() {
                    group.subject = subject;
                }
                group.objects.push(object);
            }
            None => groups.push(PemGroup {
                public_key,
                subject,
                objects: vec![object],
            }),
        }
    }

    for object in unkeyed {
        let existing = match &object {
            CertObject::Crl(crl) => groups
                .iter()
                .position(|group| group.subject.as_ref() == Some(&crl.tbs_cert_list.issuer) && !group.holds(&object)),
            _ => {
                let candidates: Vec<usize> = (0..groups.len()).filter(|&i| !groups[i].holds(&object)).collect();
                if candidates.len() == 1 {
                    candidates.first().copied()
                } else {
                    None
                }
            }
        };

        match existing {
            Some(index) => groups[index].objects.push(object),
            None => groups.push(PemGroup {
                objects: vec![object],
                ..PemGroup::default()
            }),
        }
    }
    groups
}

impl CertProvider for PemProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn file_patterns(&self) -> &'static [&'static str] {
        &["*.pem", "*.crt", "*.key", "*.csr", "*.crl"]
    }

    fn file_type(&self) -> &'static str {
        "PEM encoded file"
    }

    fn file_extension(&self) -> &'static str {
        ".pem"
    }

    fn is_encryption_supported(&self) -> bool {
        true
    }

    fn is_text(&self) -> bool {
        true
    }
}

impl CertReader for PemProvider {
    fn read_binary(
        &self,
        input: &mut dyn Read,
        resource: &str,
        _password: &dyn PasswordCallback,
    ) -> Result<ReadOutcome> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;

        let blocks = match pem::parse_many(&data) {
            Ok(blocks) => blocks,
            Err(e) if data.windows(11).any(|window| window == b"-----BEGIN ") => return Err(e.into()),
            Err(_) => return Ok(ReadOutcome::NotRecognized),
        };

        let mut objects = Vec::new();

        for block in &blocks {
            if let Some(object) = Self::decode_block(block)? {
                objects.push(object);
            }
        }

        let groups = group_objects(objects);
        let base_alias = alias_from_resource(resource);
        let group_count = groups.len();
        let mut store = CertObjectStore::new();

        for (index, group) in groups.into_iter().enumerate() {
            let alias = if group_count == 1 {
                base_alias.clone()
            } else {
                format!("{base_alias}-{}", index + 1)
            };
            for object in group.objects {
                store.add(alias.clone(), object)?;
            }
        }
        Ok(ReadOutcome::from_store(store))
    }
}

impl CertWriter for PemProvider {
    fn write_binary(&self, output: &mut dyn Write, store: &CertObjectStore, _resource: &str) -> Result<()> {
        self.write(output, store, None)
    }

    fn write_encrypted_binary(
        &self,
        output: &mut dyn Write,
        store: &CertObjectStore,
        _resource: &str,
        new_password: &str,
    ) -> Result<()> {
        self.write(output, store, Some(new_password))
    }
}
