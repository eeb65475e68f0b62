//! Certificate generation

use std::str::FromStr;
use std::time::SystemTime;

use der::asn1::{ObjectIdentifier, PrintableString};
use der::Encode;
use rcgen::{CertificateParams, CustomExtension, DistinguishedName, DnType, Issuer, KeyPair, KeyUsagePurpose};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::Name;
use x509_cert::Certificate;

use crate::asn1::decode_value;
use crate::error::{CertError, Result};
use crate::x509::extensions::{ExtensionData, KeyUsage};
use crate::x509::X509ExtensionData;

use super::objects::{CertKey, CertObject, CertObjectStore};

/// Supported key pair algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyAlgorithm {
    #[default]
    EcdsaP256,
    EcdsaP384,
    Ed25519,
    Rsa,
}

impl KeyAlgorithm {
    /// Key size used when the request names none.
    #[must_use]
    pub fn default_key_size(self) -> u32 {
        match self {
            KeyAlgorithm::EcdsaP256 | KeyAlgorithm::Ed25519 => 256,
            KeyAlgorithm::EcdsaP384 => 384,
            KeyAlgorithm::Rsa => 2048,
        }
    }

    /// Signature algorithm used when the request names none.
    #[must_use]
    pub fn default_signature_algorithm(self) -> SignatureAlgorithm {
        match self {
            KeyAlgorithm::EcdsaP256 => SignatureAlgorithm::EcdsaSha256,
            KeyAlgorithm::EcdsaP384 => SignatureAlgorithm::EcdsaSha384,
            KeyAlgorithm::Ed25519 => SignatureAlgorithm::Ed25519,
            KeyAlgorithm::Rsa => SignatureAlgorithm::RsaSha256,
        }
    }

    fn of_key_pair(key_pair: &KeyPair) -> Result<Self> {
        let algorithm = key_pair.algorithm();

        if algorithm == &rcgen::PKCS_ECDSA_P256_SHA256 {
            Ok(KeyAlgorithm::EcdsaP256)
        } else if algorithm == &rcgen::PKCS_ECDSA_P384_SHA384 {
            Ok(KeyAlgorithm::EcdsaP384)
        } else if algorithm == &rcgen::PKCS_ED25519 {
            Ok(KeyAlgorithm::Ed25519)
        } else if [&rcgen::PKCS_RSA_SHA256, &rcgen::PKCS_RSA_SHA384, &rcgen::PKCS_RSA_SHA512].contains(&algorithm) {
            Ok(KeyAlgorithm::Rsa)
        } else {
            Err(CertError::invalid_argument(format!("unsupported issuer key algorithm {algorithm:?}")))
        }
    }
}

/// Certificate signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    EcdsaSha256,
    EcdsaSha384,
    Ed25519,
    RsaSha256,
    RsaSha384,
    RsaSha512,
}

impl SignatureAlgorithm {
    /// The rcgen algorithm signing with a key of the given algorithm.
    fn for_key(self, key_algorithm: KeyAlgorithm) -> Result<&'static rcgen::SignatureAlgorithm> {
        match (key_algorithm, self) {
            (KeyAlgorithm::EcdsaP256, SignatureAlgorithm::EcdsaSha256) => Ok(&rcgen::PKCS_ECDSA_P256_SHA256),
            (KeyAlgorithm::EcdsaP384, SignatureAlgorithm::EcdsaSha384) => Ok(&rcgen::PKCS_ECDSA_P384_SHA384),
            (KeyAlgorithm::Ed25519, SignatureAlgorithm::Ed25519) => Ok(&rcgen::PKCS_ED25519),
            (KeyAlgorithm::Rsa, SignatureAlgorithm::RsaSha256) => Ok(&rcgen::PKCS_RSA_SHA256),
            (KeyAlgorithm::Rsa, SignatureAlgorithm::RsaSha384) => Ok(&rcgen::PKCS_RSA_SHA384),
            (KeyAlgorithm::Rsa, SignatureAlgorithm::RsaSha512) => Ok(&rcgen::PKCS_RSA_SHA512),
            _ => Err(CertError::invalid_argument(format!(
                "signature algorithm {self:?} cannot sign with a {key_algorithm:?} key"
            ))),
        }
    }
}

fn rsa_key_size(bits: u32) -> Result<rcgen::RsaKeySize> {
    match bits {
        2048 => Ok(rcgen::RsaKeySize::_2048),
        3072 => Ok(rcgen::RsaKeySize::_3072),
        4096 => Ok(rcgen::RsaKeySize::_4096),
        _ => Err(CertError::invalid_argument(format!("unsupported RSA key size {bits}"))),
    }
}

fn generate_key_pair(request: &GenerateCertRequest, signature: &'static rcgen::SignatureAlgorithm) -> Result<KeyPair> {
    let algorithm = request.key_algorithm;
    let key_size = request.key_size.unwrap_or_else(|| algorithm.default_key_size());

    if algorithm == KeyAlgorithm::Rsa {
        return Ok(KeyPair::generate_rsa_for(signature, rsa_key_size(key_size)?)?);
    }
    if key_size != algorithm.default_key_size() {
        return Err(CertError::invalid_argument(format!(
            "{algorithm:?} keys have a fixed size of {} bits",
            algorithm.default_key_size()
        )));
    }
    Ok(KeyPair::generate_for(signature)?)
}

/// The signing certificate and key for an issued certificate.
#[derive(Debug, Clone)]
pub struct GenerateIssuer {
    pub crt: Certificate,
    pub key: CertKey,
}

/// Parameters of a new certificate.
#[derive(Debug, Clone)]
pub struct GenerateCertRequest {
    pub alias: String,
    pub dn: String,
    pub key_algorithm: KeyAlgorithm,
    /// Key size in bits; the algorithm's default when absent.
    pub key_size: Option<u32>,
    /// Overrides the signing key's default signature algorithm.
    pub signature_algorithm: Option<SignatureAlgorithm>,
    /// Self-signed when absent.
    pub issuer: Option<GenerateIssuer>,
    pub not_before: Option<SystemTime>,
    pub not_after: Option<SystemTime>,
    pub serial: Option<u64>,
    pub extensions: Vec<X509ExtensionData>,
}

impl GenerateCertRequest {
    pub fn new(alias: impl Into<String>, dn: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            dn: dn.into(),
            key_algorithm: KeyAlgorithm::default(),
            key_size: None,
            signature_algorithm: None,
            issuer: None,
            not_before: None,
            not_after: None,
            serial: None,
            extensions: Vec::new(),
        }
    }
}

fn dn_type(oid: &ObjectIdentifier) -> DnType {
    match oid.to_string().as_str() {
        "2.5.4.3" => DnType::CommonName,
        "2.5.4.10" => DnType::OrganizationName,
        "2.5.4.11" => DnType::OrganizationalUnitName,
        "2.5.4.6" => DnType::CountryName,
        "2.5.4.8" => DnType::StateOrProvinceName,
        "2.5.4.7" => DnType::LocalityName,
        _ => DnType::CustomDnType(oid.arcs().map(u64::from).collect()),
    }
}

fn attribute_value(atv: &AttributeTypeAndValue) -> Result<String> {
    if let Ok(value) = decode_value::<String>(&atv.value) {
        return Ok(value);
    }
    let value = decode_value::<PrintableString>(&atv.value).map_err(|e| e.within(&atv.oid.to_string()))?;
    Ok(value.to_string())
}

fn distinguished_name(dn: &str) -> Result<DistinguishedName> {
    let name = Name::from_str(dn).map_err(|e| CertError::invalid_argument(format!("invalid DN '{dn}': {e}")))?;
    let mut distinguished_name = DistinguishedName::new();

    for rdn in name.0.iter() {
        for atv in rdn.0.iter() {
            distinguished_name.push(dn_type(&atv.oid), attribute_value(atv)?);
        }
    }
    Ok(distinguished_name)
}

fn key_usage_purpose(usage: KeyUsage) -> KeyUsagePurpose {
    match usage {
        KeyUsage::DigitalSignature => KeyUsagePurpose::DigitalSignature,
        KeyUsage::NonRepudiation => KeyUsagePurpose::ContentCommitment,
        KeyUsage::KeyEncipherment => KeyUsagePurpose::KeyEncipherment,
        KeyUsage::DataEncipherment => KeyUsagePurpose::DataEncipherment,
        KeyUsage::KeyAgreement => KeyUsagePurpose::KeyAgreement,
        KeyUsage::KeyCertSign => KeyUsagePurpose::KeyCertSign,
        KeyUsage::CrlSign => KeyUsagePurpose::CrlSign,
        KeyUsage::EncipherOnly => KeyUsagePurpose::EncipherOnly,
        KeyUsage::DecipherOnly => KeyUsagePurpose::DecipherOnly,
    }
}

fn apply_extensions(params: &mut CertificateParams, extensions: &[X509ExtensionData]) -> Result<()> {
    for extension in extensions {
        match extension {
            X509ExtensionData::BasicConstraints(constraints) => {
                params.is_ca = match (constraints.ca(), constraints.path_len()) {
                    (false, _) => rcgen::IsCa::ExplicitNoCa,
                    (true, None) => rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained),
                    (true, Some(len)) => {
                        let len = u8::try_from(len).map_err(|_| {
                            CertError::invalid_argument(format!("path length constraint {len} exceeds 255"))
                        })?;
                        rcgen::IsCa::Ca(rcgen::BasicConstraints::Constrained(len))
                    }
                };
            }
            X509ExtensionData::KeyUsage(usage) => {
                params.key_usages = usage.usages().iter().copied().map(key_usage_purpose).collect();
            }
            // key identifiers are derived from the keys
            X509ExtensionData::SubjectKeyIdentifier(_) | X509ExtensionData::AuthorityKeyIdentifier(_) => {}
            other => {
                let arcs: Vec<u64> = other.oid().arcs().map(u64::from).collect();
                let mut custom = CustomExtension::from_oid_content(&arcs, other.encoded()?);
                custom.set_criticality(other.critical());
                params.custom_extensions.push(custom);
            }
        }
    }
    Ok(())
}

fn issuer_key_pair(issuer: &GenerateIssuer, signature: Option<SignatureAlgorithm>) -> Result<KeyPair> {
    let key_pair = issuer.key.to_key_pair()?;

    match signature {
        None => Ok(key_pair),
        Some(signature) => {
            let algorithm = signature.for_key(KeyAlgorithm::of_key_pair(&key_pair)?)?;
            issuer.key.to_key_pair_for(algorithm)
        }
    }
}

/// Generate a key pair and a certificate for it.
///
/// The signature algorithm applies to the signing key: the new key when
/// self-signed, the issuer's key otherwise. The result holds the new key
/// and certificate under the request's alias.
pub fn generate(request: &GenerateCertRequest) -> Result<CertObjectStore> {
    let mut params = CertificateParams::new(Vec::default())?;

    params.distinguished_name = distinguished_name(&request.dn)?;
    if let Some(not_before) = request.not_before {
        params.not_before = not_before.into();
    }
    if let Some(not_after) = request.not_after {
        params.not_after = not_after.into();
    }
    if let Some(serial) = request.serial {
        params.serial_number = Some(rcgen::SerialNumber::from(serial));
    }
    apply_extensions(&mut params, &request.extensions)?;

    let key_algorithm = request.key_algorithm;
    let (key_pair, cert) = match &request.issuer {
        None => {
            let signature = request
                .signature_algorithm
                .unwrap_or_else(|| key_algorithm.default_signature_algorithm())
                .for_key(key_algorithm)?;
            let key_pair = generate_key_pair(request, signature)?;
            let cert = params.self_signed(&key_pair)?;
            (key_pair, cert)
        }
        Some(issuer) => {
            params.use_authority_key_identifier_extension = true;

            let key_pair = generate_key_pair(
                request,
                key_algorithm.default_signature_algorithm().for_key(key_algorithm)?,
            )?;
            let issuer_pem = pem::encode(&pem::Pem::new("CERTIFICATE", issuer.crt.to_der()?));
            let issuer = Issuer::from_ca_cert_pem(&issuer_pem, issuer_key_pair(issuer, request.signature_algorithm)?)?;
            let cert = params.signed_by(&key_pair, &issuer)?;
            (key_pair, cert)
        }
    };

    tracing::info!("Generated certificate '{}' for {}", request.alias, request.dn);

    let mut store = CertObjectStore::new();
    store.add_key(request.alias.clone(), CertKey::from_key_pair(&key_pair)?)?;
    store.add(request.alias.clone(), CertObject::crt_from_der(cert.der())?)?;
    Ok(store)
}
