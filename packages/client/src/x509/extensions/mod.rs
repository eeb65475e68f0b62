//! X.509 extension data
//!
//! Typed wrappers over the extension values, keyed by OID. Decoding is
//! dispatched through a fixed table; unknown OIDs yield
//! [`CustomExtensionData`] so that every extension survives a round-trip.

use der::asn1::{ObjectIdentifier, OctetString};
use der::{Any, Encode};
use x509_cert::ext::Extension;
use x509_cert::Certificate;

use crate::asn1::{decode_any, oid_display, parse_oid};
use crate::config::FormatLimits;
use crate::error::DecodeResult;

use super::attributes::Attributes;

pub mod basic_constraints;
pub mod crl_distribution_points;
pub mod custom;
pub mod extended_key_usage;
pub mod key_identifier;
pub mod key_usage;
pub mod subject_alt_name;

pub use basic_constraints::BasicConstraintsExtensionData;
pub use crl_distribution_points::CrlDistributionPointsExtensionData;
pub use custom::CustomExtensionData;
pub use extended_key_usage::ExtendedKeyUsageExtensionData;
pub use key_identifier::{AuthorityKeyIdentifierExtensionData, SubjectKeyIdentifierExtensionData};
pub use key_usage::{KeyUsage, KeyUsageExtensionData};
pub use subject_alt_name::SubjectAlternativeNameExtensionData;

/// Common contract of all extension values.
pub trait ExtensionData {
    fn oid(&self) -> ObjectIdentifier;

    fn critical(&self) -> bool;

    /// Encode the extension value.
    fn encode(&self) -> DecodeResult<Any>;

    /// DER bytes of the extension value.
    fn encoded(&self) -> DecodeResult<Vec<u8>> {
        Ok(self.encode()?.to_der()?)
    }

    /// Single line display value, truncated according to `limits`.
    fn to_value_string(&self, limits: &FormatLimits) -> String;

    /// Add variant specific child nodes.
    fn add_details(&self, _attributes: &mut Attributes, _limits: &FormatLimits) {}

    /// Lossy display projection.
    fn to_attributes(&self, limits: &FormatLimits) -> Attributes {
        let mut attributes = Attributes::new(oid_display(&self.oid()), Some(self.to_value_string(limits)));

        attributes.add("Critical", Some(self.critical().to_string()));
        self.add_details(&mut attributes, limits);
        attributes
    }
}

/// Any extension value, known or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum X509ExtensionData {
    BasicConstraints(BasicConstraintsExtensionData),
    KeyUsage(KeyUsageExtensionData),
    ExtendedKeyUsage(ExtendedKeyUsageExtensionData),
    SubjectAlternativeName(SubjectAlternativeNameExtensionData),
    SubjectKeyIdentifier(SubjectKeyIdentifierExtensionData),
    AuthorityKeyIdentifier(AuthorityKeyIdentifierExtensionData),
    CrlDistributionPoints(CrlDistributionPointsExtensionData),
    Custom(CustomExtensionData),
}

type Decoder = fn(&Any, bool) -> DecodeResult<X509ExtensionData>;

struct KnownExtension {
    oid: ObjectIdentifier,
    name: &'static str,
    decode: Decoder,
}

const KNOWN_EXTENSIONS: &[KnownExtension] = &[
    KnownExtension {
        oid: BasicConstraintsExtensionData::OID,
        name: BasicConstraintsExtensionData::NAME,
        decode: decode_basic_constraints,
    },
    KnownExtension {
        oid: KeyUsageExtensionData::OID,
        name: KeyUsageExtensionData::NAME,
        decode: decode_key_usage,
    },
    KnownExtension {
        oid: ExtendedKeyUsageExtensionData::OID,
        name: ExtendedKeyUsageExtensionData::NAME,
        decode: decode_extended_key_usage,
    },
    KnownExtension {
        oid: SubjectAlternativeNameExtensionData::OID,
        name: SubjectAlternativeNameExtensionData::NAME,
        decode: decode_subject_alt_name,
    },
    KnownExtension {
        oid: SubjectKeyIdentifierExtensionData::OID,
        name: SubjectKeyIdentifierExtensionData::NAME,
        decode: decode_subject_key_identifier,
    },
    KnownExtension {
        oid: AuthorityKeyIdentifierExtensionData::OID,
        name: AuthorityKeyIdentifierExtensionData::NAME,
        decode: decode_authority_key_identifier,
    },
    KnownExtension {
        oid: CrlDistributionPointsExtensionData::OID,
        name: CrlDistributionPointsExtensionData::NAME,
        decode: decode_crl_distribution_points,
    },
];

fn decode_basic_constraints(any: &Any, critical: bool) -> DecodeResult<X509ExtensionData> {
    BasicConstraintsExtensionData::decode(any, critical).map(X509ExtensionData::BasicConstraints)
}

fn decode_key_usage(any: &Any, critical: bool) -> DecodeResult<X509ExtensionData> {
    KeyUsageExtensionData::decode(any, critical).map(X509ExtensionData::KeyUsage)
}

fn decode_extended_key_usage(any: &Any, critical: bool) -> DecodeResult<X509ExtensionData> {
    ExtendedKeyUsageExtensionData::decode(any, critical).map(X509ExtensionData::ExtendedKeyUsage)
}

fn decode_subject_alt_name(any: &Any, critical: bool) -> DecodeResult<X509ExtensionData> {
    SubjectAlternativeNameExtensionData::decode(any, critical).map(X509ExtensionData::SubjectAlternativeName)
}

fn decode_subject_key_identifier(any: &Any, critical: bool) -> DecodeResult<X509ExtensionData> {
    SubjectKeyIdentifierExtensionData::decode(any, critical).map(X509ExtensionData::SubjectKeyIdentifier)
}

fn decode_authority_key_identifier(any: &Any, critical: bool) -> DecodeResult<X509ExtensionData> {
    AuthorityKeyIdentifierExtensionData::decode(any, critical).map(X509ExtensionData::AuthorityKeyIdentifier)
}

fn decode_crl_distribution_points(any: &Any, critical: bool) -> DecodeResult<X509ExtensionData> {
    CrlDistributionPointsExtensionData::decode(any, critical).map(X509ExtensionData::CrlDistributionPoints)
}

impl X509ExtensionData {
    /// Decode an extension value; unmapped OIDs become [`CustomExtensionData`].
    pub fn decode(oid: &ObjectIdentifier, critical: bool, value: &[u8]) -> DecodeResult<Self> {
        match KNOWN_EXTENSIONS.iter().find(|known| known.oid == *oid) {
            Some(known) => {
                let any = decode_any(value).map_err(|e| e.within(known.name))?;
                (known.decode)(&any, critical).map_err(|e| e.within(known.name))
            }
            None => Ok(X509ExtensionData::Custom(CustomExtensionData::new(*oid, critical, value.to_vec()))),
        }
    }

    /// Decode an extension value for a dotted OID string.
    pub fn decode_str(oid: &str, critical: bool, value: &[u8]) -> DecodeResult<Self> {
        Self::decode(&parse_oid(oid)?, critical, value)
    }

    pub fn from_extension(extension: &Extension) -> DecodeResult<Self> {
        Self::decode(&extension.extn_id, extension.critical, extension.extn_value.as_bytes())
    }

    pub fn to_extension(&self) -> DecodeResult<Extension> {
        Ok(Extension {
            extn_id: self.oid(),
            critical: self.critical(),
            extn_value: OctetString::new(self.encoded()?)?,
        })
    }

    /// Whether the OID has a dedicated decoder.
    #[must_use]
    pub fn is_known(oid: &ObjectIdentifier) -> bool {
        KNOWN_EXTENSIONS.iter().any(|known| known.oid == *oid)
    }

    fn data(&self) -> &dyn ExtensionData {
        match self {
            X509ExtensionData::BasicConstraints(data) => data,
            X509ExtensionData::KeyUsage(data) => data,
            X509ExtensionData::ExtendedKeyUsage(data) => data,
            X509ExtensionData::SubjectAlternativeName(data) => data,
            X509ExtensionData::SubjectKeyIdentifier(data) => data,
            X509ExtensionData::AuthorityKeyIdentifier(data) => data,
            X509ExtensionData::CrlDistributionPoints(data) => data,
            X509ExtensionData::Custom(data) => data,
        }
    }
}

impl ExtensionData for X509ExtensionData {
    fn oid(&self) -> ObjectIdentifier {
        self.data().oid()
    }

    fn critical(&self) -> bool {
        self.data().critical()
    }

    fn encode(&self) -> DecodeResult<Any> {
        self.data().encode()
    }

    fn encoded(&self) -> DecodeResult<Vec<u8>> {
        self.data().encoded()
    }

    fn to_value_string(&self, limits: &FormatLimits) -> String {
        self.data().to_value_string(limits)
    }

    fn add_details(&self, attributes: &mut Attributes, limits: &FormatLimits) {
        self.data().add_details(attributes, limits);
    }
}

/// Decode all extensions of a certificate, in order.
pub fn extensions_of(certificate: &Certificate) -> DecodeResult<Vec<X509ExtensionData>> {
    certificate
        .tbs_certificate
        .extensions
        .iter()
        .flatten()
        .map(X509ExtensionData::from_extension)
        .collect()
}

/// Find and decode one extension of a certificate.
pub fn find_extension(certificate: &Certificate, oid: &ObjectIdentifier) -> DecodeResult<Option<X509ExtensionData>> {
    certificate
        .tbs_certificate
        .extensions
        .iter()
        .flatten()
        .find(|extension| extension.extn_id == *oid)
        .map(X509ExtensionData::from_extension)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x509::general_name::GeneralName;
    use crate::x509::general_names::GeneralNames;

    #[test]
    fn test_dispatch_known_oid() {
        let data = BasicConstraintsExtensionData::new(true, true, Some(1));
        let bytes = data.encoded().unwrap();

        let decoded = X509ExtensionData::decode_str("2.5.29.19", true, &bytes).unwrap();
        assert_eq!(decoded, X509ExtensionData::BasicConstraints(data));
    }

    #[test]
    fn test_unknown_oid_is_custom_and_exact() {
        let bytes = vec![0x04, 0x03, 0x01, 0x02, 0x03];
        let decoded = X509ExtensionData::decode_str("1.3.6.1.4.1.99999.7", false, &bytes).unwrap();

        assert!(matches!(decoded, X509ExtensionData::Custom(_)));
        assert_eq!(decoded.encoded().unwrap(), bytes);
    }

    #[test]
    fn test_custom_keeps_invalid_der() {
        let bytes = vec![0xff, 0x00, 0x13, 0x37];
        let decoded = X509ExtensionData::decode_str("1.2.3.4", true, &bytes).unwrap();

        assert_eq!(decoded.encoded().unwrap(), bytes);
        assert!(decoded.critical());
        assert_eq!(
            decoded.to_value_string(&FormatLimits::default()),
            "FF:00:13:37"
        );
    }

    #[test]
    fn test_known_oid_with_bad_data_names_variant() {
        let err = X509ExtensionData::decode_str("2.5.29.17", false, &[0x01, 0x01, 0xff]).unwrap_err();
        assert_eq!(err.context(), "SubjectAlternativeName");
    }

    #[test]
    fn test_to_attributes() {
        let data = X509ExtensionData::SubjectAlternativeName(SubjectAlternativeNameExtensionData::new(
            false,
            GeneralNames::new(vec![GeneralName::Dns("example.org".to_string())]),
        ));
        let attributes = data.to_attributes(&FormatLimits::default());

        assert_eq!(attributes.value(), Some("DNS:example.org"));
        assert_eq!(attributes.child("Critical").and_then(Attributes::value), Some("false"));
        assert_eq!(attributes.child("DNS [0]").and_then(Attributes::value), Some("example.org"));
    }

    #[test]
    fn test_extension_conversion() {
        let data = X509ExtensionData::KeyUsage(KeyUsageExtensionData::new(true, [KeyUsage::DigitalSignature]));
        let extension = data.to_extension().unwrap();

        assert!(extension.critical);
        assert_eq!(X509ExtensionData::from_extension(&extension).unwrap(), data);
    }
}
