use std::collections::BTreeSet;

use der::asn1::{BitString, ObjectIdentifier};
use der::Any;

use crate::asn1::{decode_value, encode_any};
use crate::config::FormatLimits;
use crate::error::DecodeResult;
use crate::x509::attributes::Attributes;
use crate::x509::bits::{named_bit_string, named_bits};

use super::ExtensionData;

/// Named bits of the KeyUsage bit string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyUsage {
    DigitalSignature,
    NonRepudiation,
    KeyEncipherment,
    DataEncipherment,
    KeyAgreement,
    KeyCertSign,
    CrlSign,
    EncipherOnly,
    DecipherOnly,
}

impl KeyUsage {
    pub const ALL: [KeyUsage; 9] = [
        KeyUsage::DigitalSignature,
        KeyUsage::NonRepudiation,
        KeyUsage::KeyEncipherment,
        KeyUsage::DataEncipherment,
        KeyUsage::KeyAgreement,
        KeyUsage::KeyCertSign,
        KeyUsage::CrlSign,
        KeyUsage::EncipherOnly,
        KeyUsage::DecipherOnly,
    ];

    #[must_use]
    pub fn bit(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            KeyUsage::DigitalSignature => "digitalSignature",
            KeyUsage::NonRepudiation => "nonRepudiation",
            KeyUsage::KeyEncipherment => "keyEncipherment",
            KeyUsage::DataEncipherment => "dataEncipherment",
            KeyUsage::KeyAgreement => "keyAgreement",
            KeyUsage::KeyCertSign => "keyCertSign",
            KeyUsage::CrlSign => "cRLSign",
            KeyUsage::EncipherOnly => "encipherOnly",
            KeyUsage::DecipherOnly => "decipherOnly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUsageExtensionData {
    critical: bool,
    usages: BTreeSet<KeyUsage>,
}

impl KeyUsageExtensionData {
    pub const OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.15");
    pub const NAME: &'static str = "KeyUsage";

    pub fn new(critical: bool, usages: impl IntoIterator<Item = KeyUsage>) -> Self {
        Self {
            critical,
            usages: usages.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn usages(&self) -> &BTreeSet<KeyUsage> {
        &self.usages
    }

    #[must_use]
    pub fn has_usage(&self, usage: KeyUsage) -> bool {
        self.usages.contains(&usage)
    }

    pub fn decode(any: &Any, critical: bool) -> DecodeResult<Self> {
        let bits: BitString = decode_value(any)?;
        let usages = named_bits(&bits, &KeyUsage::ALL)?;

        Ok(Self {
            critical,
            usages: usages.into_iter().collect(),
        })
    }
}

impl ExtensionData for KeyUsageExtensionData {
    fn oid(&self) -> ObjectIdentifier {
        Self::OID
    }

    fn critical(&self) -> bool {
        self.critical
    }

    fn encode(&self) -> DecodeResult<Any> {
        encode_any(&named_bit_string(self.usages.iter().map(|usage| usage.bit()))?)
    }

    fn to_value_string(&self, _limits: &FormatLimits) -> String {
        self.usages
            .iter()
            .map(|usage| usage.label())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn add_details(&self, attributes: &mut Attributes, _limits: &FormatLimits) {
        for usage in &self.usages {
            attributes.add(usage.label(), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use der::{Decode, Encode};

    use super::*;

    #[test]
    fn test_round_trip() {
        let data = KeyUsageExtensionData::new(
            true,
            [KeyUsage::KeyCertSign, KeyUsage::CrlSign, KeyUsage::DigitalSignature],
        );
        let bytes = data.encode().unwrap().to_der().unwrap();

        // 03 02 01 86: one unused bit, bits 0, 5 and 6
        assert_eq!(bytes, vec![0x03, 0x02, 0x01, 0x86]);

        let decoded = KeyUsageExtensionData::decode(&Any::from_der(&bytes).unwrap(), true).unwrap();
        assert_eq!(decoded, data);
        assert_eq!(
            decoded.to_value_string(&FormatLimits::default()),
            "digitalSignature, keyCertSign, cRLSign"
        );
    }

    #[test]
    fn test_decipher_only_uses_second_byte() {
        let data = KeyUsageExtensionData::new(false, [KeyUsage::KeyAgreement, KeyUsage::DecipherOnly]);
        let bytes = data.encode().unwrap().to_der().unwrap();
        let decoded = KeyUsageExtensionData::decode(&Any::from_der(&bytes).unwrap(), false).unwrap();

        assert!(decoded.has_usage(KeyUsage::DecipherOnly));
        assert_eq!(decoded, data);
    }
}
