//! Certificate fixtures generated with rcgen

#![allow(dead_code)]

use std::time::{Duration, SystemTime};

use certmgr_core::{EngineConfig, UserCertStore, UserCertStoreEntry};
use rcgen::{
    BasicConstraints, CertificateParams, CertificateRevocationListParams, DistinguishedName, DnType, IsCa, Issuer,
    KeyIdMethod, KeyPair, KeyUsagePurpose, RevokedCertParams, SerialNumber,
};

pub const DAY: Duration = Duration::from_secs(24 * 3600);

/// A generated certificate with its key and parameters.
pub struct Fixture {
    pub params: CertificateParams,
    pub key_pem: String,
    pub cert_pem: String,
    pub cert_der: Vec<u8>,
}

impl Fixture {
    pub fn key(&self) -> KeyPair {
        KeyPair::from_pem(&self.key_pem).expect("fixture key should parse")
    }

    pub fn issuer(&self) -> Issuer<'static, KeyPair> {
        Issuer::new(self.params.clone(), self.key())
    }

    /// Certificate followed by key, PEM encoded.
    pub fn pem_with_key(&self) -> String {
        format!("{}{}", self.cert_pem, self.key_pem)
    }
}

pub fn params(cn: &str, ca: bool, serial: u64) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::default()).expect("empty SAN list should be accepted");
    let mut dn = DistinguishedName::new();

    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    params.serial_number = Some(SerialNumber::from(serial));
    params.not_before = (SystemTime::now() - DAY).into();
    params.not_after = (SystemTime::now() + DAY).into();
    if ca {
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
    } else {
        params.is_ca = IsCa::ExplicitNoCa;
    }
    params
}

pub fn build(params: CertificateParams, issuer: Option<&Fixture>) -> Fixture {
    let key = KeyPair::generate().expect("key generation should succeed");
    let cert = match issuer {
        None => params.self_signed(&key).expect("self signing should succeed"),
        Some(issuer) => params
            .signed_by(&key, &issuer.issuer())
            .expect("signing should succeed"),
    };

    Fixture {
        params,
        key_pem: key.serialize_pem(),
        cert_pem: cert.pem(),
        cert_der: cert.der().to_vec(),
    }
}

pub fn root(cn: &str) -> Fixture {
    build(params(cn, true, 1), None)
}

pub fn intermediate(cn: &str, issuer: &Fixture) -> Fixture {
    build(params(cn, true, 2), Some(issuer))
}

pub fn leaf(cn: &str, serial: u64, issuer: &Fixture) -> Fixture {
    build(params(cn, false, serial), Some(issuer))
}

/// CRL of `issuer` listing the given serials, PEM encoded.
pub fn crl_pem(issuer: &Fixture, serials: &[u64]) -> String {
    let now = SystemTime::now();
    let params = CertificateRevocationListParams {
        this_update: now.into(),
        next_update: (now + DAY).into(),
        crl_number: SerialNumber::from(1u64),
        issuing_distribution_point: None,
        revoked_certs: serials
            .iter()
            .map(|&serial| RevokedCertParams {
                serial_number: SerialNumber::from(serial),
                revocation_time: now.into(),
                reason_code: None,
                invalidity_date: None,
            })
            .collect(),
        key_identifier_method: KeyIdMethod::Sha256,
    };

    params
        .signed_by(&issuer.issuer())
        .expect("CRL signing should succeed")
        .pem()
        .expect("CRL should encode")
}

pub fn load(data: &str) -> UserCertStore {
    let loader = certmgr_core::StoreLoader::new(certmgr_core::ProviderRegistry::builtin(), EngineConfig::default());

    loader.load_data(data, "fixtures.pem").expect("fixture data should load")
}

/// The entry whose name is `CN=<cn>`.
pub fn entry<'s>(store: &'s UserCertStore, cn: &str) -> UserCertStoreEntry<'s> {
    let name = format!("CN={cn}");

    store
        .entries()
        .find(|entry| entry.name() == name)
        .unwrap_or_else(|| panic!("no entry named {name}"))
}
