//! End to end use of the fluent builders

use std::time::Duration;

use certmgr::extensions::{
    BasicConstraintsExtensionData, KeyUsage, KeyUsageExtensionData, SubjectAlternativeNameExtensionData,
};
use certmgr::{
    CertMgr, CertObjectStore, CertWriter, FixedPassword, GeneralName, GeneralNames, KeyAlgorithm, PemProvider,
    SignatureAlgorithm, X509ExtensionData,
};

const DAY: Duration = Duration::from_secs(24 * 3600);

fn pem_text(objects: &CertObjectStore) -> String {
    PemProvider.write_string(objects, "objects").expect("PEM encoding")
}

fn ca_objects() -> CertObjectStore {
    CertMgr::generate("ca", "CN=Facade CA,O=Example")
        .valid_for(DAY)
        .serial(1)
        .extension(X509ExtensionData::BasicConstraints(BasicConstraintsExtensionData::new(
            true,
            true,
            Some(0),
        )))
        .extension(X509ExtensionData::KeyUsage(KeyUsageExtensionData::new(
            true,
            [KeyUsage::KeyCertSign, KeyUsage::CrlSign],
        )))
        .generate()
        .expect("CA generation")
}

#[test]
fn test_generate_issue_and_export() {
    let ca_text = pem_text(&ca_objects());
    let ca_store = CertMgr::store().data(ca_text.clone(), "ca.pem").load().expect("CA store");
    let ca = ca_store.root_entries()[0];

    assert!(ca.can_issue());
    assert!(ca.is_valid());

    let server_objects = CertMgr::generate("server", "CN=server.example.org")
        .valid_for(DAY)
        .serial(2)
        .extension(X509ExtensionData::SubjectAlternativeName(
            SubjectAlternativeNameExtensionData::new(
                false,
                GeneralNames::from(vec![GeneralName::Dns("server.example.org".to_string())]),
            ),
        ))
        .issued_by(ca)
        .generate()
        .expect("server generation");

    let store = CertMgr::store()
        .data(format!("{ca_text}{}", pem_text(&server_objects)), "all.pem")
        .load()
        .expect("combined store");
    let server = store
        .entries()
        .find(|entry| entry.name() == "CN=server.example.org")
        .expect("server entry");

    assert_eq!(server.issuer().name(), "CN=Facade CA,O=Example");
    assert!(!server.can_issue());
    assert!(!server.is_revoked());

    let text = CertMgr::export(server).chain_root().to_text().expect("text export");
    assert_eq!(text.matches("-----BEGIN CERTIFICATE-----").count(), 2);
    assert!(!text.contains("PRIVATE KEY"));
}

#[test]
fn test_export_to_directory_and_reload() {
    let ca_text = pem_text(&ca_objects());
    let store = CertMgr::store().data(ca_text, "ca.pem").load().expect("CA store");
    let ca = store.root_entries()[0];
    let dir = tempfile::tempdir().expect("temp dir");

    let paths = CertMgr::export(ca)
        .key()
        .format("DER")
        .to_directory(dir.path())
        .expect("directory export");
    assert_eq!(paths.len(), 2);

    let reloaded = CertMgr::store().file(dir.path()).load().expect("reload directory");
    assert_eq!(reloaded.len(), 1);
    assert!(reloaded.root_entries()[0].has_key());
}

#[test]
fn test_encrypted_export_round_trip() {
    let ca_text = pem_text(&ca_objects());
    let store = CertMgr::store().data(ca_text, "ca.pem").load().expect("CA store");
    let ca = store.root_entries()[0];
    let password = FixedPassword::new("changeit");
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ca.pem");

    CertMgr::export(ca)
        .key()
        .encrypt()
        .password(&password)
        .to_file(&path)
        .expect("encrypted export");

    let locked = CertMgr::store().file(&path).load().expect("reload");
    assert!(locked.root_entries()[0].key().expect_err("locked key").is_password_required());

    let unlocked = CertMgr::store().file(&path).password(&password).load().expect("reload");
    let entry = unlocked.root_entries()[0];
    assert!(entry.key_with(&password).is_ok());
    assert!(entry.can_issue());
}

#[test]
fn test_load_requires_source() {
    assert!(CertMgr::store().load().is_err());
    assert!(CertMgr::store().url("not a url").load().is_err());
}

#[test]
fn test_unknown_export_format() {
    let store = CertMgr::store().data(pem_text(&ca_objects()), "ca.pem").load().expect("CA store");

    let err = CertMgr::export(store.root_entries()[0]).format("PKCS12").to_text().expect_err("unknown writer");
    assert!(err.is_not_found());
}

#[test]
fn test_rsa_ca_issues_with_chosen_signature() {
    let ca_objects = CertMgr::generate("rsa-ca", "CN=RSA CA")
        .key_algorithm(KeyAlgorithm::Rsa)
        .key_size(3072)
        .valid_for(DAY)
        .extension(X509ExtensionData::BasicConstraints(BasicConstraintsExtensionData::new(
            true, true, None,
        )))
        .generate()
        .expect("RSA CA generation");
    let ca_text = pem_text(&ca_objects);
    let ca_store = CertMgr::store().data(ca_text.clone(), "rsa-ca.pem").load().expect("CA store");

    let server_objects = CertMgr::generate("server", "CN=rsa.example.org")
        .valid_for(DAY)
        .signature_algorithm(SignatureAlgorithm::RsaSha384)
        .issued_by(ca_store.root_entries()[0])
        .generate()
        .expect("server generation");

    let store = CertMgr::store()
        .data(format!("{ca_text}{}", pem_text(&server_objects)), "all.pem")
        .load()
        .expect("combined store");
    let depths: Vec<usize> = store.walk().into_iter().map(|(depth, _)| depth).collect();

    assert_eq!(depths, vec![0, 1]);
}
