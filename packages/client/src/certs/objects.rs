//! Typed certificate objects and the alias keyed object store

use std::fmt;

use der::{Decode, Encode};
use pkcs8::{EncryptedPrivateKeyInfo, PrivateKeyInfo};
use x509_cert::crl::CertificateList;
use x509_cert::name::Name;
use x509_cert::request::CertReq;
use x509_cert::Certificate;
use zeroize::Zeroizing;

use crate::error::{CertError, Result};

use super::password::PasswordCallback;

pub const PEM_PRIVATE_KEY: &str = "PRIVATE KEY";
pub const PEM_PUBLIC_KEY: &str = "PUBLIC KEY";

/// The kinds of objects an alias can hold, one of each at most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CertObjectKind {
    Crt,
    Key,
    Csr,
    Crl,
}

impl CertObjectKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CertObjectKind::Crt => "CRT",
            CertObjectKind::Key => "Key",
            CertObjectKind::Csr => "CSR",
            CertObjectKind::Crl => "CRL",
        }
    }
}

/// An unencrypted PKCS#8 private key plus its public key.
#[derive(Clone)]
pub struct CertKey {
    pkcs8: Zeroizing<Vec<u8>>,
    public_key: Vec<u8>,
}

impl CertKey {
    /// Load a PKCS#8 DER private key and derive its public key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let key_pair = key_pair_from_pkcs8(der)?;
        let public_key = pem::parse(key_pair.public_key_pem())?.into_contents();

        Ok(Self {
            pkcs8: Zeroizing::new(der.to_vec()),
            public_key,
        })
    }

    pub fn from_key_pair(key_pair: &rcgen::KeyPair) -> Result<Self> {
        Self::from_pkcs8_der(&Zeroizing::new(key_pair.serialize_der()))
    }

    #[must_use]
    pub fn pkcs8_der(&self) -> &[u8] {
        &self.pkcs8
    }

    /// DER encoded SubjectPublicKeyInfo.
    #[must_use]
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key
    }

    pub fn to_key_pair(&self) -> Result<rcgen::KeyPair> {
        key_pair_from_pkcs8(&self.pkcs8)
    }

    /// Key pair signing with the given algorithm instead of the key's default.
    pub fn to_key_pair_for(&self, algorithm: &'static rcgen::SignatureAlgorithm) -> Result<rcgen::KeyPair> {
        let pem = Zeroizing::new(pem::encode(&pem::Pem::new(PEM_PRIVATE_KEY, self.pkcs8.to_vec())));

        Ok(rcgen::KeyPair::from_pem_and_sign_algo(&pem, algorithm)?)
    }

    /// Encrypt into a PKCS#8 `EncryptedPrivateKeyInfo`.
    pub fn encrypt(&self, password: &str) -> Result<EncryptedCertKey> {
        let info = PrivateKeyInfo::try_from(self.pkcs8.as_slice()).map_err(CertError::encode)?;
        let document = info
            .encrypt(pkcs8::rand_core::OsRng, password.as_bytes())
            .map_err(CertError::encode)?;

        Ok(EncryptedCertKey {
            encrypted: document.as_bytes().to_vec(),
        })
    }
}

fn key_pair_from_pkcs8(der: &[u8]) -> Result<rcgen::KeyPair> {
    let pem = Zeroizing::new(pem::encode(&pem::Pem::new(PEM_PRIVATE_KEY, der.to_vec())));

    Ok(rcgen::KeyPair::from_pem(&pem)?)
}

impl PartialEq for CertKey {
    fn eq(&self, other: &Self) -> bool {
        self.pkcs8 == other.pkcs8
    }
}

impl fmt::Debug for CertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertKey")
            .field("public_key", &hex::encode(&self.public_key))
            .finish_non_exhaustive()
    }
}

/// A PKCS#8 encrypted private key, decrypted on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedCertKey {
    encrypted: Vec<u8>,
}

impl EncryptedCertKey {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        EncryptedPrivateKeyInfo::try_from(der).map_err(|e| CertError::decode("EncryptedPrivateKeyInfo", e))?;

        Ok(Self {
            encrypted: der.to_vec(),
        })
    }

    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.encrypted
    }

    /// Decrypt with a known password.
    pub fn decrypt(&self, password: &str) -> Result<CertKey> {
        let info = EncryptedPrivateKeyInfo::try_from(self.encrypted.as_slice())
            .map_err(|e| CertError::decode("EncryptedPrivateKeyInfo", e))?;
        let document = info
            .decrypt(password.as_bytes())
            .map_err(|e| CertError::decode("EncryptedPrivateKeyInfo", e))?;

        CertKey::from_pkcs8_der(document.as_bytes())
    }

    /// Decrypt querying the callback; re-queries after each failed attempt.
    pub fn decrypt_with(&self, callback: &dyn PasswordCallback, resource: &str) -> Result<CertKey> {
        let mut password = callback.query_password(resource);

        while let Some(candidate) = password {
            match self.decrypt(&candidate) {
                Ok(key) => return Ok(key),
                Err(e) => {
                    tracing::debug!("Decrypting {} failed: {}", resource, e);
                    password = callback.password_required(resource);
                }
            }
        }
        Err(CertError::password_required(resource))
    }
}

/// A key slot: plain or still encrypted.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredKey {
    Plain(CertKey),
    Encrypted(EncryptedCertKey),
}

impl StoredKey {
    #[must_use]
    pub fn is_decrypted(&self) -> bool {
        matches!(self, StoredKey::Plain(_))
    }

    /// Resolve the key, decrypting through the callback if needed.
    pub fn resolve(&self, callback: &dyn PasswordCallback, resource: &str) -> Result<CertKey> {
        match self {
            StoredKey::Plain(key) => Ok(key.clone()),
            StoredKey::Encrypted(encrypted) => encrypted.decrypt_with(callback, resource),
        }
    }

    /// Public key, when available without a password.
    #[must_use]
    pub fn public_key_der(&self) -> Option<&[u8]> {
        match self {
            StoredKey::Plain(key) => Some(key.public_key_der()),
            StoredKey::Encrypted(_) => None,
        }
    }
}

/// One typed certificate object.
#[derive(Debug, Clone, PartialEq)]
pub enum CertObject {
    Crt(Box<Certificate>),
    Key(StoredKey),
    Csr(Box<CertReq>),
    Crl(Box<CertificateList>),
}

impl CertObject {
    pub fn crt_from_der(der: &[u8]) -> Result<Self> {
        Ok(CertObject::Crt(Box::new(Certificate::from_der(der).map_err(|e| {
            CertError::Decode(crate::error::DecodeError::from(e).within("Certificate"))
        })?)))
    }

    pub fn csr_from_der(der: &[u8]) -> Result<Self> {
        Ok(CertObject::Csr(Box::new(CertReq::from_der(der).map_err(|e| {
            CertError::Decode(crate::error::DecodeError::from(e).within("CertificationRequest"))
        })?)))
    }

    pub fn crl_from_der(der: &[u8]) -> Result<Self> {
        Ok(CertObject::Crl(Box::new(CertificateList::from_der(der).map_err(|e| {
            CertError::Decode(crate::error::DecodeError::from(e).within("CertificateList"))
        })?)))
    }

    pub fn key_from_pkcs8_der(der: &[u8]) -> Result<Self> {
        Ok(CertObject::Key(StoredKey::Plain(CertKey::from_pkcs8_der(der)?)))
    }

    pub fn encrypted_key_from_der(der: &[u8]) -> Result<Self> {
        Ok(CertObject::Key(StoredKey::Encrypted(EncryptedCertKey::from_der(der)?)))
    }

    #[must_use]
    pub fn kind(&self) -> CertObjectKind {
        match self {
            CertObject::Crt(_) => CertObjectKind::Crt,
            CertObject::Key(_) => CertObjectKind::Key,
            CertObject::Csr(_) => CertObjectKind::Csr,
            CertObject::Crl(_) => CertObjectKind::Crl,
        }
    }

    /// DER encoding of the object; encrypted keys yield their encrypted form.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        match self {
            CertObject::Crt(crt) => Ok(crt.to_der()?),
            CertObject::Key(StoredKey::Plain(key)) => Ok(key.pkcs8_der().to_vec()),
            CertObject::Key(StoredKey::Encrypted(key)) => Ok(key.as_der().to_vec()),
            CertObject::Csr(csr) => Ok(csr.to_der()?),
            CertObject::Crl(crl) => Ok(crl.to_der()?),
        }
    }

    /// DER encoded SubjectPublicKeyInfo, if derivable without a password.
    #[must_use]
    pub fn public_key_der(&self) -> Option<Vec<u8>> {
        match self {
            CertObject::Crt(crt) => crt.tbs_certificate.subject_public_key_info.to_der().ok(),
            CertObject::Key(key) => key.public_key_der().map(<[u8]>::to_vec),
            CertObject::Csr(csr) => csr.info.public_key.to_der().ok(),
            CertObject::Crl(_) => None,
        }
    }

    /// Subject (CRT, CSR) or issuer (CRL) name of the object.
    #[must_use]
    pub fn name(&self) -> Option<&Name> {
        match self {
            CertObject::Crt(crt) => Some(&crt.tbs_certificate.subject),
            CertObject::Csr(csr) => Some(&csr.info.subject),
            CertObject::Crl(crl) => Some(&crl.tbs_cert_list.issuer),
            CertObject::Key(_) => None,
        }
    }
}

/// An alias and one of its objects.
#[derive(Debug, Clone, PartialEq)]
pub struct CertObjectStoreEntry {
    alias: String,
    object: CertObject,
}

impl CertObjectStoreEntry {
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[must_use]
    pub fn object(&self) -> &CertObject {
        &self.object
    }

    #[must_use]
    pub fn kind(&self) -> CertObjectKind {
        self.object.kind()
    }
}

/// The objects held by one alias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasGroup {
    pub alias: String,
    pub crt: Option<Box<Certificate>>,
    pub key: Option<StoredKey>,
    pub csr: Option<Box<CertReq>>,
    pub crl: Option<Box<CertificateList>>,
}

impl AliasGroup {
    /// Public key of the group: certificate, then key, then request.
    #[must_use]
    pub fn public_key_der(&self) -> Option<Vec<u8>> {
        if let Some(crt) = &self.crt {
            return crt.tbs_certificate.subject_public_key_info.to_der().ok();
        }
        if let Some(key) = self.key.as_ref().and_then(StoredKey::public_key_der) {
            return Some(key.to_vec());
        }
        self.csr.as_ref().and_then(|csr| csr.info.public_key.to_der().ok())
    }
}

/// Ordered alias keyed bag of certificate objects.
///
/// Insertion order is preserved; an alias holds at most one object per kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CertObjectStore {
    entries: Vec<CertObjectStoreEntry>,
}

impl CertObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single object store, e.g. for per-object export.
    pub fn wrap(entry: &CertObjectStoreEntry) -> Self {
        Self {
            entries: vec![entry.clone()],
        }
    }

    pub fn add(&mut self, alias: impl Into<String>, object: CertObject) -> Result<()> {
        let alias = alias.into();
        let kind = object.kind();

        if self.get(&alias, kind).is_some() {
            return Err(CertError::invalid_argument(format!(
                "alias '{alias}' already holds a {} object",
                kind.label()
            )));
        }
        self.entries.push(CertObjectStoreEntry { alias, object });
        Ok(())
    }

    pub fn add_crt(&mut self, alias: impl Into<String>, crt: Certificate) -> Result<()> {
        self.add(alias, CertObject::Crt(Box::new(crt)))
    }

    pub fn add_key(&mut self, alias: impl Into<String>, key: CertKey) -> Result<()> {
        self.add(alias, CertObject::Key(StoredKey::Plain(key)))
    }

    pub fn add_encrypted_key(&mut self, alias: impl Into<String>, key: EncryptedCertKey) -> Result<()> {
        self.add(alias, CertObject::Key(StoredKey::Encrypted(key)))
    }

    pub fn add_csr(&mut self, alias: impl Into<String>, csr: CertReq) -> Result<()> {
        self.add(alias, CertObject::Csr(Box::new(csr)))
    }

    pub fn add_crl(&mut self, alias: impl Into<String>, crl: CertificateList) -> Result<()> {
        self.add(alias, CertObject::Crl(Box::new(crl)))
    }

    #[must_use]
    pub fn get(&self, alias: &str, kind: CertObjectKind) -> Option<&CertObject> {
        self.entries
            .iter()
            .find(|entry| entry.alias == alias && entry.kind() == kind)
            .map(|entry| &entry.object)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CertObjectStoreEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct aliases in first appearance order.
    #[must_use]
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = Vec::new();

        for entry in &self.entries {
            if !aliases.contains(&entry.alias.as_str()) {
                aliases.push(&entry.alias);
            }
        }
        aliases
    }

    /// The objects grouped by alias, in first appearance order.
    #[must_use]
    pub fn groups(&self) -> Vec<AliasGroup> {
        self.aliases()
            .into_iter()
            .map(|alias| {
                let mut group = AliasGroup {
                    alias: alias.to_string(),
                    ..AliasGroup::default()
                };
                for entry in self.entries.iter().filter(|entry| entry.alias == alias) {
                    match &entry.object {
                        CertObject::Crt(crt) => group.crt = Some(crt.clone()),
                        CertObject::Key(key) => group.key = Some(key.clone()),
                        CertObject::Csr(csr) => group.csr = Some(csr.clone()),
                        CertObject::Crl(crl) => group.crl = Some(crl.clone()),
                    }
                }
                group
            })
            .collect()
    }

    /// Append all objects of another store.
    pub fn extend(&mut self, other: CertObjectStore) -> Result<()> {
        for entry in other.entries {
            self.add(entry.alias, entry.object)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a CertObjectStore {
    type Item = &'a CertObjectStoreEntry;
    type IntoIter = std::slice::Iter<'a, CertObjectStoreEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
