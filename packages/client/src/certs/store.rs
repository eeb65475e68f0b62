//! User certificate store and issuer graph
//!
//! A store is built once from a set of object stores and never mutated; a
//! reload builds a new store. Entries live in an arena and are handed out as
//! lightweight [`UserCertStoreEntry`] handles.

use std::collections::HashMap;
use std::fmt;

use der::Encode;
use x509_cert::crl::CertificateList;
use x509_cert::name::Name;
use x509_cert::request::CertReq;
use x509_cert::Certificate;

use crate::config::EngineConfig;
use crate::error::{CertError, Result};
use crate::x509::extensions::{
    AuthorityKeyIdentifierExtensionData, BasicConstraintsExtensionData, SubjectKeyIdentifierExtensionData,
};
use crate::x509::{find_extension, X509ExtensionData};

use super::entry_id::{EntryIdGenerator, UserCertStoreEntryId};
use super::objects::{AliasGroup, CertKey, StoredKey};
use super::password::{NoPassword, PasswordCallback};

/// Payload of an entry, selected at construction.
trait EntryObjects: fmt::Debug + Send + Sync {
    fn crt(&self) -> Option<&Certificate>;
    fn key(&self) -> Option<&StoredKey>;
    fn csr(&self) -> Option<&CertReq>;
    fn crl(&self) -> Option<&CertificateList>;
    fn sources(&self) -> &[String];
}

/// Objects loaded from one or more sources.
#[derive(Debug, Default)]
struct ResolvedObjects {
    crt: Option<Box<Certificate>>,
    key: Option<StoredKey>,
    csr: Option<Box<CertReq>>,
    crl: Option<Box<CertificateList>>,
    sources: Vec<String>,
}

impl ResolvedObjects {
    fn from_group(group: AliasGroup, source: &str) -> Self {
        Self {
            crt: group.crt,
            key: group.key,
            csr: group.csr,
            crl: group.crl,
            sources: vec![source.to_string()],
        }
    }

    /// Whether the group's objects fit into the free slots.
    fn can_merge(&self, group: &AliasGroup) -> bool {
        (group.crt.is_none() || self.crt.is_none() || self.crt == group.crt)
            && (group.key.is_none() || self.key.is_none() || self.key == group.key)
            && (group.csr.is_none() || self.csr.is_none() || self.csr == group.csr)
            && (group.crl.is_none() || self.crl.is_none() || self.crl == group.crl)
    }

    fn merge(&mut self, group: AliasGroup, source: &str) {
        if self.crt.is_none() {
            self.crt = group.crt;
        }
        if self.key.is_none() {
            self.key = group.key;
        }
        if self.csr.is_none() {
            self.csr = group.csr;
        }
        if self.crl.is_none() {
            self.crl = group.crl;
        }
        if !self.sources.iter().any(|known| known == source) {
            self.sources.push(source.to_string());
        }
    }
}

impl EntryObjects for ResolvedObjects {
    fn crt(&self) -> Option<&Certificate> {
        self.crt.as_deref()
    }

    fn key(&self) -> Option<&StoredKey> {
        self.key.as_ref()
    }

    fn csr(&self) -> Option<&CertReq> {
        self.csr.as_deref()
    }

    fn crl(&self) -> Option<&CertificateList> {
        self.crl.as_deref()
    }

    fn sources(&self) -> &[String] {
        &self.sources
    }
}

/// Placeholder for an issuer that could not be resolved.
#[derive(Debug)]
struct ExternalObjects;

impl EntryObjects for ExternalObjects {
    fn crt(&self) -> Option<&Certificate> {
        None
    }

    fn key(&self) -> Option<&StoredKey> {
        None
    }

    fn csr(&self) -> Option<&CertReq> {
        None
    }

    fn crl(&self) -> Option<&CertificateList> {
        None
    }

    fn sources(&self) -> &[String] {
        &[]
    }
}

#[derive(Debug)]
struct EntryNode {
    id: UserCertStoreEntryId,
    dn: Option<Name>,
    objects: Box<dyn EntryObjects>,
    issuer: usize,
}

/// A loaded certificate store with its issuer graph.
#[derive(Debug)]
pub struct UserCertStore {
    nodes: Vec<EntryNode>,
    issued: Vec<Vec<usize>>,
    config: EngineConfig,
}

/// Alias assigned to external issuer placeholders.
pub const EXTERNAL_ALIAS: &str = "external";

impl UserCertStore {
    /// Build the issuer graph from decoded object stores.
    ///
    /// Each source is a pair of resource name and object store.
    pub fn from_object_stores<I>(sources: I, config: EngineConfig) -> Self
    where
        I: IntoIterator<Item = (String, super::objects::CertObjectStore)>,
    {
        let mut groups = Vec::new();

        for (source, store) in sources {
            for group in store.groups() {
                groups.push((source.clone(), group));
            }
        }

        let mut builder = GraphBuilder::default();

        // certificates first so that keys, requests and CRLs can attach
        let (with_crt, rest): (Vec<_>, Vec<_>) = groups.into_iter().partition(|(_, group)| group.crt.is_some());
        let (with_public_key, crl_only): (Vec<_>, Vec<_>) = rest
            .into_iter()
            .partition(|(_, group)| group.key.is_some() || group.csr.is_some());

        for (source, group) in with_crt {
            builder.add_crt_group(group, &source);
        }
        for (source, group) in with_public_key {
            builder.add_public_key_group(group, &source);
        }
        for (source, group) in crl_only {
            builder.add_crl_group(group, &source);
        }

        let store = builder.build(config);

        tracing::info!(
            "Loaded certificate store with {} entries ({} roots)",
            store.nodes.len(),
            store.root_indices().len()
        );
        store
    }

    /// An empty store.
    #[must_use]
    pub fn empty(config: EngineConfig) -> Self {
        GraphBuilder::default().build(config)
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All entries in construction order.
    pub fn entries(&self) -> impl Iterator<Item = UserCertStoreEntry<'_>> {
        (0..self.nodes.len()).map(move |index| UserCertStoreEntry { store: self, index })
    }

    /// Entries that are their own issuer.
    #[must_use]
    pub fn root_entries(&self) -> Vec<UserCertStoreEntry<'_>> {
        self.root_indices()
            .into_iter()
            .map(|index| UserCertStoreEntry { store: self, index })
            .collect()
    }

    #[must_use]
    pub fn entry(&self, id: &UserCertStoreEntryId) -> Option<UserCertStoreEntry<'_>> {
        self.nodes
            .iter()
            .position(|node| &node.id == id)
            .map(|index| UserCertStoreEntry { store: self, index })
    }

    /// Entries issued by the given entry, excluding the entry itself.
    #[must_use]
    pub fn issued_entries(&self, id: &UserCertStoreEntryId) -> Vec<UserCertStoreEntry<'_>> {
        match self.nodes.iter().position(|node| &node.id == id) {
            Some(index) => self.issued_by(index),
            None => Vec::new(),
        }
    }

    fn issued_by(&self, index: usize) -> Vec<UserCertStoreEntry<'_>> {
        self.issued[index]
            .iter()
            .map(|&child| UserCertStoreEntry { store: self, index: child })
            .collect()
    }

    fn root_indices(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&index| self.nodes[index].issuer == index)
            .collect()
    }

    /// Depth first traversal of the issuer tree, yielding `(depth, entry)` rows.
    ///
    /// Every entry is yielded exactly once. Entries only reachable through an
    /// issuer cycle are yielded as additional top level rows.
    #[must_use]
    pub fn walk(&self) -> Vec<(usize, UserCertStoreEntry<'_>)> {
        let mut visited = vec![false; self.nodes.len()];
        let mut rows = Vec::with_capacity(self.nodes.len());
        let mut starts = self.root_indices();

        starts.extend(0..self.nodes.len());

        for start in starts {
            if visited[start] {
                continue;
            }
            if self.nodes[start].issuer != start {
                tracing::warn!("Entry {} is not reachable from any root entry", self.nodes[start].id);
            }

            let mut stack = vec![(0usize, start)];

            while let Some((depth, index)) = stack.pop() {
                if visited[index] {
                    continue;
                }
                visited[index] = true;
                rows.push((depth, UserCertStoreEntry { store: self, index }));

                for &child in self.issued[index].iter().rev() {
                    if !visited[child] {
                        stack.push((depth + 1, child));
                    }
                }
            }
        }
        rows
    }
}

#[derive(Default)]
struct GraphBuilder {
    nodes: Vec<(UserCertStoreEntryId, ResolvedObjects)>,
    ids: EntryIdGenerator,
}

impl GraphBuilder {
    fn push(&mut self, group: AliasGroup, source: &str) {
        let id = self.ids.next_id(&group.alias);
        self.nodes.push((id, ResolvedObjects::from_group(group, source)));
    }

    fn add_crt_group(&mut self, group: AliasGroup, source: &str) {
        let existing = self.nodes.iter().position(|(_, objects)| {
            objects.crt.is_some() && objects.crt == group.crt && objects.can_merge(&group)
        });

        match existing {
            Some(index) => self.nodes[index].1.merge(group, source),
            None => self.push(group, source),
        }
    }

    fn add_public_key_group(&mut self, group: AliasGroup, source: &str) {
        let existing = group.public_key_der().and_then(|public_key| {
            self.nodes.iter().position(|(_, objects)| {
                objects.crt.as_ref().is_some_and(|crt| {
                    crt.tbs_certificate.subject_public_key_info.to_der().ok().as_deref() == Some(public_key.as_slice())
                }) && objects.can_merge(&group)
            })
        });

        match existing {
            Some(index) => self.nodes[index].1.merge(group, source),
            None => self.push(group, source),
        }
    }

    fn add_crl_group(&mut self, group: AliasGroup, source: &str) {
        let existing = group.crl.as_ref().and_then(|crl| {
            self.nodes.iter().position(|(_, objects)| {
                objects
                    .crt
                    .as_ref()
                    .is_some_and(|crt| crt.tbs_certificate.subject == crl.tbs_cert_list.issuer)
                    && objects.can_merge(&group)
            })
        });

        match existing {
            Some(index) => self.nodes[index].1.merge(group, source),
            None => self.push(group, source),
        }
    }

    fn build(mut self, config: EngineConfig) -> UserCertStore {
        let mut nodes: Vec<EntryNode> = Vec::with_capacity(self.nodes.len());
        let mut externals: HashMap<Vec<u8>, usize> = HashMap::new();
        let resolved = std::mem::take(&mut self.nodes);

        for (index, (id, objects)) in resolved.into_iter().enumerate() {
            let dn = objects
                .crt
                .as_ref()
                .map(|crt| crt.tbs_certificate.subject.clone())
                .or_else(|| objects.csr.as_ref().map(|csr| csr.info.subject.clone()))
                .or_else(|| objects.crl.as_ref().map(|crl| crl.tbs_cert_list.issuer.clone()));

            nodes.push(EntryNode {
                id,
                dn,
                objects: Box::new(objects),
                issuer: index,
            });
        }

        let resolved_count = nodes.len();

        for index in 0..resolved_count {
            let (resolved_issuer, issuer_dn) = match nodes[index].objects.crt() {
                Some(crt) => (
                    resolve_issuer(&nodes[..resolved_count], index, crt),
                    crt.tbs_certificate.issuer.clone(),
                ),
                None => continue,
            };
            let issuer = match resolved_issuer {
                Some(issuer) => issuer,
                None => {
                    let key = issuer_dn.to_der().unwrap_or_else(|_| issuer_dn.to_string().into_bytes());
                    *externals.entry(key).or_insert_with(|| {
                        let external = nodes.len();
                        nodes.push(EntryNode {
                            id: self.ids.next_id(EXTERNAL_ALIAS),
                            dn: Some(issuer_dn.clone()),
                            objects: Box::new(ExternalObjects),
                            issuer: external,
                        });
                        external
                    })
                }
            };
            nodes[index].issuer = issuer;
        }

        let mut issued = vec![Vec::new(); nodes.len()];

        for (index, node) in nodes.iter().enumerate() {
            if node.issuer != index {
                issued[node.issuer].push(index);
            }
        }

        UserCertStore { nodes, issued, config }
    }
}

/// Resolve the issuer of a certificate by subject name, preferring a key
/// identifier match.
fn resolve_issuer(nodes: &[EntryNode], index: usize, crt: &Certificate) -> Option<usize> {
    let issuer_dn = &crt.tbs_certificate.issuer;
    let candidates: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            node.objects
                .crt()
                .is_some_and(|candidate| &candidate.tbs_certificate.subject == issuer_dn)
        })
        .map(|(candidate, _)| candidate)
        .collect();

    if candidates.is_empty() {
        return None;
    }

    if let Some(authority_key_id) = authority_key_identifier(crt) {
        let by_key_id = candidates.iter().copied().find(|&candidate| {
            nodes[candidate]
                .objects
                .crt()
                .and_then(subject_key_identifier)
                .is_some_and(|subject_key_id| subject_key_id == authority_key_id)
        });
        if by_key_id.is_some() {
            return by_key_id;
        }
    }

    if candidates.contains(&index) {
        Some(index)
    } else {
        candidates.first().copied()
    }
}

fn authority_key_identifier(crt: &Certificate) -> Option<Vec<u8>> {
    match find_extension(crt, &AuthorityKeyIdentifierExtensionData::OID) {
        Ok(Some(X509ExtensionData::AuthorityKeyIdentifier(data))) => data.key_identifier,
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Ignoring undecodable authority key identifier: {}", e);
            None
        }
    }
}

fn subject_key_identifier(crt: &Certificate) -> Option<Vec<u8>> {
    match find_extension(crt, &SubjectKeyIdentifierExtensionData::OID) {
        Ok(Some(X509ExtensionData::SubjectKeyIdentifier(data))) => Some(data.key_identifier().to_vec()),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Ignoring undecodable subject key identifier: {}", e);
            None
        }
    }
}

/// Handle to one entry of a [`UserCertStore`].
#[derive(Clone, Copy)]
pub struct UserCertStoreEntry<'s> {
    store: &'s UserCertStore,
    index: usize,
}

impl<'s> UserCertStoreEntry<'s> {
    fn node(&self) -> &'s EntryNode {
        &self.store.nodes[self.index]
    }

    #[must_use]
    pub fn store(&self) -> &'s UserCertStore {
        self.store
    }

    #[must_use]
    pub fn id(&self) -> &'s UserCertStoreEntryId {
        &self.node().id
    }

    #[must_use]
    pub fn dn(&self) -> Option<&'s Name> {
        self.node().dn.as_ref()
    }

    /// The distinguished name, or the id when no name is known.
    #[must_use]
    pub fn name(&self) -> String {
        match self.dn() {
            Some(dn) => dn.to_string(),
            None => self.id().to_string(),
        }
    }

    /// Resources the entry's objects were loaded from.
    #[must_use]
    pub fn sources(&self) -> &'s [String] {
        self.node().objects.sources()
    }

    /// The issuing entry; self-signed entries return themselves.
    #[must_use]
    pub fn issuer(&self) -> UserCertStoreEntry<'s> {
        UserCertStoreEntry {
            store: self.store,
            index: self.node().issuer,
        }
    }

    #[must_use]
    pub fn issued_entries(&self) -> Vec<UserCertStoreEntry<'s>> {
        self.store.issued_by(self.index)
    }

    #[must_use]
    pub fn is_self_signed(&self) -> bool {
        self.node().issuer == self.index
    }

    #[must_use]
    pub fn has_crt(&self) -> bool {
        self.node().objects.crt().is_some()
    }

    #[must_use]
    pub fn has_key(&self) -> bool {
        self.node().objects.key().is_some()
    }

    #[must_use]
    pub fn has_decrypted_key(&self) -> bool {
        self.node().objects.key().is_some_and(StoredKey::is_decrypted)
    }

    #[must_use]
    pub fn has_csr(&self) -> bool {
        self.node().objects.csr().is_some()
    }

    #[must_use]
    pub fn has_crl(&self) -> bool {
        self.node().objects.crl().is_some()
    }

    #[must_use]
    pub fn has_public_key(&self) -> bool {
        self.has_crt() || self.has_decrypted_key() || self.has_csr()
    }

    /// Placeholder for an unresolved issuer: no objects at all.
    #[must_use]
    pub fn is_external(&self) -> bool {
        !self.has_crt() && !self.has_key() && !self.has_csr() && !self.has_crl()
    }

    pub fn crt(&self) -> Result<&'s Certificate> {
        self.node()
            .objects
            .crt()
            .ok_or_else(|| CertError::not_found(format!("CRT of {}", self.id())))
    }

    /// The key, assuming it needs no password.
    pub fn key(&self) -> Result<CertKey> {
        self.key_with(&NoPassword)
    }

    /// The key, decrypted through the callback if needed.
    pub fn key_with(&self, password: &dyn PasswordCallback) -> Result<CertKey> {
        let resource = self.id().to_string();

        self.stored_key()?.resolve(password, &resource)
    }

    pub fn stored_key(&self) -> Result<&'s StoredKey> {
        self.node()
            .objects
            .key()
            .ok_or_else(|| CertError::not_found(format!("Key of {}", self.id())))
    }

    pub fn csr(&self) -> Result<&'s CertReq> {
        self.node()
            .objects
            .csr()
            .ok_or_else(|| CertError::not_found(format!("CSR of {}", self.id())))
    }

    pub fn crl(&self) -> Result<&'s CertificateList> {
        self.node()
            .objects
            .crl()
            .ok_or_else(|| CertError::not_found(format!("CRL of {}", self.id())))
    }

    /// DER encoded public key: certificate, then decrypted key, then request.
    pub fn public_key(&self) -> Result<Vec<u8>> {
        if let Some(crt) = self.node().objects.crt() {
            return Ok(crt.tbs_certificate.subject_public_key_info.to_der()?);
        }
        if let Some(StoredKey::Plain(key)) = self.node().objects.key() {
            return Ok(key.public_key_der().to_vec());
        }
        if let Some(csr) = self.node().objects.csr() {
            return Ok(csr.info.public_key.to_der()?);
        }
        Err(CertError::not_found(format!("public key of {}", self.id())))
    }

    /// False only for a certificate outside of `[notBefore, notAfter)`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let Some(crt) = self.node().objects.crt() else {
            return true;
        };
        let validity = &crt.tbs_certificate.validity;
        let now = std::time::SystemTime::now();

        validity.not_before.to_system_time() <= now && now < validity.not_after.to_system_time()
    }

    /// Whether the issuer's CRL lists this entry's certificate.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        if self.is_self_signed() {
            return false;
        }
        let Some(crt) = self.node().objects.crt() else {
            return false;
        };
        let Some(crl) = self.issuer().node().objects.crl() else {
            return false;
        };

        match crl_lists_serial(crl, crt.tbs_certificate.serial_number.as_bytes()) {
            Ok(revoked) => revoked,
            Err(e) => {
                tracing::warn!("Revocation check for {} failed: {}", self.id(), e);
                false
            }
        }
    }

    /// Whether the entry holds a key and a CA certificate.
    #[must_use]
    pub fn can_issue(&self) -> bool {
        if !self.has_key() {
            return false;
        }
        let Some(crt) = self.node().objects.crt() else {
            return false;
        };

        match find_extension(crt, &BasicConstraintsExtensionData::OID) {
            Ok(Some(X509ExtensionData::BasicConstraints(constraints))) => constraints.path_len_constraint() >= 0,
            Ok(_) => false,
            Err(e) => {
                tracing::warn!("Basic constraints check for {} failed: {}", self.id(), e);
                false
            }
        }
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn crl_lists_serial(crl: &CertificateList, serial: &[u8]) -> Result<bool> {
    let der = crl.to_der()?;
    let (_, parsed) = x509_parser::parse_x509_crl(&der)
        .map_err(|e| CertError::decode("CertificateList", e))?;
    let serial = strip_leading_zeros(serial);

    let listed = parsed
        .iter_revoked_certificates()
        .any(|revoked| strip_leading_zeros(revoked.raw_serial()) == serial);
    Ok(listed)
}

impl PartialEq for UserCertStoreEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.store, other.store) && self.index == other.index
    }
}

impl Eq for UserCertStoreEntry<'_> {}

impl fmt::Debug for UserCertStoreEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCertStoreEntry")
            .field("id", self.id())
            .field("dn", &self.dn().map(ToString::to_string))
            .finish()
    }
}

impl fmt::Display for UserCertStoreEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certs::objects::CertObjectStore;

    #[test]
    fn test_strip_leading_zeros() {
        assert_eq!(strip_leading_zeros(&[0, 0, 1, 0]), &[1, 0]);
        assert!(strip_leading_zeros(&[0]).is_empty());
    }

    #[test]
    fn test_empty_store() {
        let store = UserCertStore::from_object_stores(Vec::<(String, CertObjectStore)>::new(), EngineConfig::default());

        assert!(store.is_empty());
        assert!(store.walk().is_empty());
        assert!(store.root_entries().is_empty());
    }
}
