use der::asn1::ObjectIdentifier;
use der::Any;

use crate::asn1::decode_any;
use crate::config::FormatLimits;
use crate::error::DecodeResult;
use crate::x509::attributes::bytes_to_string;

use super::ExtensionData;

/// Fallback for extensions without a dedicated decoder.
///
/// The encoded value is retained byte for byte, even when it is not valid DER.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomExtensionData {
    oid: ObjectIdentifier,
    critical: bool,
    encoded: Vec<u8>,
}

impl CustomExtensionData {
    #[must_use]
    pub fn new(oid: ObjectIdentifier, critical: bool, encoded: Vec<u8>) -> Self {
        Self { oid, critical, encoded }
    }

    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.encoded
    }
}

impl ExtensionData for CustomExtensionData {
    fn oid(&self) -> ObjectIdentifier {
        self.oid
    }

    fn critical(&self) -> bool {
        self.critical
    }

    fn encode(&self) -> DecodeResult<Any> {
        decode_any(&self.encoded)
    }

    fn encoded(&self) -> DecodeResult<Vec<u8>> {
        Ok(self.encoded.clone())
    }

    fn to_value_string(&self, limits: &FormatLimits) -> String {
        bytes_to_string(&self.encoded, limits.short)
    }
}
