use der::asn1::ObjectIdentifier;
use der::Any;

use crate::config::FormatLimits;
use crate::error::DecodeResult;
use crate::x509::attributes::{Attributes, AttributesContent};
use crate::x509::general_names::GeneralNames;

use super::ExtensionData;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAlternativeNameExtensionData {
    critical: bool,
    names: GeneralNames,
}

impl SubjectAlternativeNameExtensionData {
    pub const OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.17");
    pub const NAME: &'static str = "SubjectAlternativeName";

    #[must_use]
    pub fn new(critical: bool, names: GeneralNames) -> Self {
        Self { critical, names }
    }

    #[must_use]
    pub fn names(&self) -> &GeneralNames {
        &self.names
    }

    pub fn decode(any: &Any, critical: bool) -> DecodeResult<Self> {
        Ok(Self {
            critical,
            names: GeneralNames::decode(any)?,
        })
    }
}

impl ExtensionData for SubjectAlternativeNameExtensionData {
    fn oid(&self) -> ObjectIdentifier {
        Self::OID
    }

    fn critical(&self) -> bool {
        self.critical
    }

    fn encode(&self) -> DecodeResult<Any> {
        self.names.encode()
    }

    fn to_value_string(&self, limits: &FormatLimits) -> String {
        self.names.to_value_string(limits.long)
    }

    fn add_details(&self, attributes: &mut Attributes, limits: &FormatLimits) {
        self.names.add_to_attributes(attributes, limits);
    }
}
