use const_oid::db::rfc5280;
use der::asn1::ObjectIdentifier;
use der::Any;

use crate::asn1::{decode_sequence, decode_value, encode_any, encode_sequence, oid_label};
use crate::config::FormatLimits;
use crate::error::DecodeResult;
use crate::x509::attributes::{join_limited, Attributes};

use super::ExtensionData;

pub const SERVER_AUTH: ObjectIdentifier = rfc5280::ID_KP_SERVER_AUTH;
pub const CLIENT_AUTH: ObjectIdentifier = rfc5280::ID_KP_CLIENT_AUTH;
pub const CODE_SIGNING: ObjectIdentifier = rfc5280::ID_KP_CODE_SIGNING;
pub const EMAIL_PROTECTION: ObjectIdentifier = rfc5280::ID_KP_EMAIL_PROTECTION;
pub const TIME_STAMPING: ObjectIdentifier = rfc5280::ID_KP_TIME_STAMPING;
pub const OCSP_SIGNING: ObjectIdentifier = rfc5280::ID_KP_OCSP_SIGNING;

/// `ExtKeyUsageSyntax ::= SEQUENCE SIZE (1..MAX) OF KeyPurposeId`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedKeyUsageExtensionData {
    critical: bool,
    usages: Vec<ObjectIdentifier>,
}

impl ExtendedKeyUsageExtensionData {
    pub const OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.37");
    pub const NAME: &'static str = "ExtendedKeyUsage";

    #[must_use]
    pub fn new(critical: bool, usages: Vec<ObjectIdentifier>) -> Self {
        Self { critical, usages }
    }

    #[must_use]
    pub fn usages(&self) -> &[ObjectIdentifier] {
        &self.usages
    }

    pub fn decode(any: &Any, critical: bool) -> DecodeResult<Self> {
        let usages = decode_sequence(any, 1, usize::MAX)?
            .iter()
            .enumerate()
            .map(|(index, element)| decode_value(element).map_err(|e| e.within(&format!("[{index}]"))))
            .collect::<DecodeResult<Vec<ObjectIdentifier>>>()?;

        Ok(Self { critical, usages })
    }
}

impl ExtensionData for ExtendedKeyUsageExtensionData {
    fn oid(&self) -> ObjectIdentifier {
        Self::OID
    }

    fn critical(&self) -> bool {
        self.critical
    }

    fn encode(&self) -> DecodeResult<Any> {
        let elements = self.usages.iter().map(encode_any).collect::<DecodeResult<Vec<_>>>()?;
        encode_sequence(&elements)
    }

    fn to_value_string(&self, limits: &FormatLimits) -> String {
        join_limited(self.usages.iter().map(oid_label), limits.long)
    }

    fn add_details(&self, attributes: &mut Attributes, _limits: &FormatLimits) {
        for usage in &self.usages {
            attributes.add(oid_label(usage), Some(usage.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use der::{Decode, Encode};

    use super::*;

    #[test]
    fn test_round_trip() {
        let data = ExtendedKeyUsageExtensionData::new(false, vec![SERVER_AUTH, CLIENT_AUTH]);
        let bytes = data.encode().unwrap().to_der().unwrap();
        let decoded = ExtendedKeyUsageExtensionData::decode(&Any::from_der(&bytes).unwrap(), false).unwrap();

        assert_eq!(decoded, data);
        assert_eq!(
            decoded.to_value_string(&FormatLimits::default()),
            "id-kp-serverAuth, id-kp-clientAuth"
        );
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let empty = encode_sequence(&[]).unwrap();
        assert!(ExtendedKeyUsageExtensionData::decode(&empty, false).is_err());
    }
}
