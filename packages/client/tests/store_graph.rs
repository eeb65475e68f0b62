//! Issuer graph construction and entry predicates

mod common;

use std::time::SystemTime;

use certmgr_core::certs::objects::CertObjectStore;
use certmgr_core::{EngineConfig, UserCertStore};
use common::{build, entry, intermediate, leaf, load, params, root, DAY};

#[test]
fn test_chain_resolves_issuers() {
    let ca = root("Root");
    let sub = intermediate("Intermediate", &ca);
    let server = leaf("Server", 10, &sub);
    let store = load(&format!("{}{}{}", server.cert_pem, sub.cert_pem, ca.cert_pem));

    assert_eq!(store.len(), 3);

    let server_entry = entry(&store, "Server");
    let sub_entry = entry(&store, "Intermediate");
    let root_entry = entry(&store, "Root");

    assert_eq!(server_entry.issuer(), sub_entry);
    assert_eq!(sub_entry.issuer(), root_entry);
    assert!(root_entry.is_self_signed());
    assert!(!server_entry.is_self_signed());
    assert_eq!(store.root_entries(), vec![root_entry]);
    assert_eq!(root_entry.issued_entries(), vec![sub_entry]);
    assert_eq!(store.issued_entries(sub_entry.id()), vec![server_entry]);
}

#[test]
fn test_walk_yields_depths() {
    let ca = root("Root");
    let sub = intermediate("Intermediate", &ca);
    let server = leaf("Server", 10, &sub);
    let store = load(&format!("{}{}{}", server.cert_pem, ca.cert_pem, sub.cert_pem));

    let rows: Vec<(usize, String)> = store.walk().into_iter().map(|(depth, entry)| (depth, entry.name())).collect();

    assert_eq!(
        rows,
        vec![
            (0, "CN=Root".to_string()),
            (1, "CN=Intermediate".to_string()),
            (2, "CN=Server".to_string()),
        ]
    );
}

#[test]
fn test_missing_issuer_becomes_external_entry() {
    let ca = root("Hidden Root");
    let first = leaf("First", 10, &ca);
    let second = leaf("Second", 11, &ca);
    let store = load(&format!("{}{}", first.cert_pem, second.cert_pem));

    // both leaves share one placeholder
    assert_eq!(store.len(), 3);

    let external = entry(&store, "Hidden Root");
    assert!(external.is_external());
    assert!(external.is_self_signed());
    assert!(!external.has_crt());
    assert!(external.crt().unwrap_err().is_not_found());
    assert!(external.public_key().unwrap_err().is_not_found());
    assert_eq!(entry(&store, "First").issuer(), external);
    assert_eq!(external.issued_entries().len(), 2);
}

#[test]
fn test_cross_issued_entries_terminate_walk() {
    let a_params = params("A", true, 1);
    let b_params = params("B", true, 2);
    let b_self = build(b_params.clone(), None);
    let a = build(a_params, Some(&b_self));
    let b = build(b_params, Some(&a));
    let store = load(&format!("{}{}", a.cert_pem, b.cert_pem));

    let a_entry = entry(&store, "A");
    let b_entry = entry(&store, "B");
    assert_eq!(a_entry.issuer(), b_entry);
    assert_eq!(b_entry.issuer(), a_entry);
    assert!(store.root_entries().is_empty());

    let rows = store.walk();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, 0);
}

#[test]
fn test_key_and_crl_merge_into_certificate_entry() {
    let ca = root("Root");
    let server = leaf("Server", 42, &ca);
    let store = load(&format!(
        "{}{}{}{}",
        ca.cert_pem,
        server.cert_pem,
        server.key_pem,
        common::crl_pem(&ca, &[])
    ));

    assert_eq!(store.len(), 2);

    let server_entry = entry(&store, "Server");
    assert!(server_entry.has_crt());
    assert!(server_entry.has_key());
    assert!(server_entry.has_decrypted_key());
    assert_eq!(
        server_entry.key().unwrap().public_key_der(),
        server_entry.public_key().unwrap().as_slice()
    );
    assert!(entry(&store, "Root").has_crl());
}

#[test]
fn test_sources_merge_across_object_stores() {
    let ca = root("Root");
    let loader = certmgr_core::StoreLoader::new(certmgr_core::ProviderRegistry::builtin(), EngineConfig::default());
    let dir = tempfile::tempdir().expect("temp dir");

    std::fs::write(dir.path().join("root.crt"), &ca.cert_pem).expect("write crt");
    std::fs::write(dir.path().join("root.key"), &ca.key_pem).expect("write key");
    std::fs::write(dir.path().join("notes.txt"), "not a certificate").expect("write notes");

    let store = loader.load_files(&[dir.path().to_path_buf()]).expect("directory should load");

    assert_eq!(store.len(), 1);
    let root_entry = entry(&store, "Root");
    assert!(root_entry.has_key());
    assert_eq!(root_entry.sources().len(), 2);
    assert!(root_entry.can_issue());
}

#[test]
fn test_validity_window() {
    let mut valid = params("Valid", false, 1);
    valid.not_before = (SystemTime::now() - DAY).into();
    valid.not_after = (SystemTime::now() + DAY).into();

    let mut expired = params("Expired", false, 2);
    expired.not_before = (SystemTime::now() - DAY).into();
    expired.not_after = (SystemTime::now() - std::time::Duration::from_secs(1)).into();

    let store = load(&format!("{}{}", build(valid, None).cert_pem, build(expired, None).cert_pem));

    assert!(entry(&store, "Valid").is_valid());
    assert!(!entry(&store, "Expired").is_valid());
}

#[test]
fn test_revocation_by_issuer_crl() {
    let ca = root("Root");
    let revoked = leaf("Revoked", 42, &ca);
    let good = leaf("Good", 43, &ca);
    let store = load(&format!(
        "{}{}{}{}",
        ca.cert_pem,
        revoked.cert_pem,
        good.cert_pem,
        common::crl_pem(&ca, &[42, 1])
    ));

    assert!(entry(&store, "Revoked").is_revoked());
    assert!(!entry(&store, "Good").is_revoked());
    // the root is self-signed, its own CRL never revokes it
    assert!(!entry(&store, "Root").is_revoked());
}

#[test]
fn test_can_issue_requires_ca_and_key() {
    let ca = root("Root");
    let server = leaf("Server", 5, &ca);
    let store = load(&format!("{}{}", ca.pem_with_key(), server.pem_with_key()));

    assert!(entry(&store, "Root").can_issue());
    assert!(!entry(&store, "Server").can_issue());

    let without_key = load(&ca.cert_pem);
    assert!(!entry(&without_key, "Root").can_issue());
}

#[test]
fn test_empty_sources() {
    let store = UserCertStore::from_object_stores(vec![("empty".to_string(), CertObjectStore::new())], EngineConfig::default());

    assert!(store.is_empty());
}
