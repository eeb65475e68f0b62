//! Subject and Authority Key Identifier extensions

use der::asn1::{ObjectIdentifier, OctetString};
use der::{Any, Tag};

use crate::asn1::{context_tag, decode_implicit, decode_sequence, decode_tagged, decode_value, encode_any, encode_implicit, encode_sequence, encode_tagged};
use crate::config::FormatLimits;
use crate::error::{DecodeError, DecodeResult};
use crate::x509::attributes::{bytes_to_string, Attributes, AttributesContent};
use crate::x509::general_names::GeneralNames;

use super::ExtensionData;

/// `SubjectKeyIdentifier ::= KeyIdentifier (OCTET STRING)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifierExtensionData {
    critical: bool,
    key_identifier: Vec<u8>,
}

impl SubjectKeyIdentifierExtensionData {
    pub const OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.14");
    pub const NAME: &'static str = "SubjectKeyIdentifier";

    #[must_use]
    pub fn new(critical: bool, key_identifier: Vec<u8>) -> Self {
        Self { critical, key_identifier }
    }

    #[must_use]
    pub fn key_identifier(&self) -> &[u8] {
        &self.key_identifier
    }

    pub fn decode(any: &Any, critical: bool) -> DecodeResult<Self> {
        let octets: OctetString = decode_value(any)?;

        Ok(Self {
            critical,
            key_identifier: octets.into_bytes(),
        })
    }
}

impl ExtensionData for SubjectKeyIdentifierExtensionData {
    fn oid(&self) -> ObjectIdentifier {
        Self::OID
    }

    fn critical(&self) -> bool {
        self.critical
    }

    fn encode(&self) -> DecodeResult<Any> {
        encode_any(&OctetString::new(self.key_identifier.clone())?)
    }

    fn to_value_string(&self, limits: &FormatLimits) -> String {
        bytes_to_string(&self.key_identifier, limits.short)
    }
}

/// ```text
/// AuthorityKeyIdentifier ::= SEQUENCE {
///     keyIdentifier             [0] KeyIdentifier           OPTIONAL,
///     authorityCertIssuer       [1] GeneralNames            OPTIONAL,
///     authorityCertSerialNumber [2] CertificateSerialNumber OPTIONAL  }
/// ```
///
/// The serial number is kept as raw INTEGER content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityKeyIdentifierExtensionData {
    critical: bool,
    pub key_identifier: Option<Vec<u8>>,
    pub authority_cert_issuer: Option<GeneralNames>,
    pub authority_cert_serial: Option<Vec<u8>>,
}

impl AuthorityKeyIdentifierExtensionData {
    pub const OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.35");
    pub const NAME: &'static str = "AuthorityKeyIdentifier";

    #[must_use]
    pub fn new(critical: bool, key_identifier: Option<Vec<u8>>) -> Self {
        Self {
            critical,
            key_identifier,
            ..Self::default()
        }
    }

    pub fn decode(any: &Any, critical: bool) -> DecodeResult<Self> {
        let mut data = Self::new(critical, None);

        for element in decode_sequence(any, 0, 3)? {
            match context_tag(&element) {
                Some(0) => {
                    let octets: OctetString =
                        decode_implicit(&element, 0, Tag::OctetString).map_err(|e| e.within("keyIdentifier"))?;
                    data.key_identifier = Some(octets.into_bytes());
                }
                Some(1) => {
                    data.authority_cert_issuer = Some(
                        GeneralNames::decode_implicit(&element, 1).map_err(|e| e.within("authorityCertIssuer"))?,
                    );
                }
                Some(2) => {
                    let tagged = decode_tagged(&element, 2)?;
                    data.authority_cert_serial = Some(tagged.value().to_vec());
                }
                _ => {
                    return Err(DecodeError::unexpected_tag("", "[0], [1] or [2]", der::Tagged::tag(&element)));
                }
            }
        }
        Ok(data)
    }
}

impl ExtensionData for AuthorityKeyIdentifierExtensionData {
    fn oid(&self) -> ObjectIdentifier {
        Self::OID
    }

    fn critical(&self) -> bool {
        self.critical
    }

    fn encode(&self) -> DecodeResult<Any> {
        let mut elements = Vec::new();

        if let Some(key_identifier) = &self.key_identifier {
            elements.push(encode_implicit(0, &OctetString::new(key_identifier.clone())?)?);
        }
        if let Some(issuer) = &self.authority_cert_issuer {
            elements.push(issuer.encode_implicit(1)?);
        }
        if let Some(serial) = &self.authority_cert_serial {
            elements.push(encode_tagged(2, false, serial)?);
        }
        encode_sequence(&elements)
    }

    fn to_value_string(&self, limits: &FormatLimits) -> String {
        match (&self.key_identifier, &self.authority_cert_issuer) {
            (Some(key_identifier), _) => bytes_to_string(key_identifier, limits.short),
            (None, Some(issuer)) => issuer.to_value_string(limits.long),
            (None, None) => String::new(),
        }
    }

    fn add_details(&self, attributes: &mut Attributes, limits: &FormatLimits) {
        if let Some(key_identifier) = &self.key_identifier {
            attributes.add("Key identifier", Some(bytes_to_string(key_identifier, limits.short)));
        }
        if let Some(issuer) = &self.authority_cert_issuer {
            let child = attributes.add("Authority certificate issuer", None);
            issuer.add_to_attributes(child, limits);
        }
        if let Some(serial) = &self.authority_cert_serial {
            attributes.add("Authority certificate serial", Some(bytes_to_string(serial, limits.short)));
        }
    }
}

#[cfg(test)]
mod tests {
    use der::{Decode, Encode};

    use super::*;
    use crate::x509::general_name::GeneralName;

    #[test]
    fn test_subject_key_identifier_round_trip() {
        let data = SubjectKeyIdentifierExtensionData::new(false, vec![0xde, 0xad, 0xbe, 0xef]);
        let bytes = data.encode().unwrap().to_der().unwrap();
        let decoded = SubjectKeyIdentifierExtensionData::decode(&Any::from_der(&bytes).unwrap(), false).unwrap();

        assert_eq!(decoded, data);
        assert_eq!(decoded.to_value_string(&FormatLimits::default()), "DE:AD:BE:EF");
    }

    #[test]
    fn test_authority_key_identifier_round_trip() {
        let data = AuthorityKeyIdentifierExtensionData {
            critical: false,
            key_identifier: Some(vec![1, 2, 3]),
            authority_cert_issuer: Some(GeneralNames::new(vec![GeneralName::Dns("ca.example.org".into())])),
            authority_cert_serial: Some(vec![0x00, 0x80]),
        };
        let bytes = data.encode().unwrap().to_der().unwrap();
        let decoded = AuthorityKeyIdentifierExtensionData::decode(&Any::from_der(&bytes).unwrap(), false).unwrap();

        assert_eq!(decoded, data);
    }
}
