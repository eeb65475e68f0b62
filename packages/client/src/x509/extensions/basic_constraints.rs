use der::asn1::ObjectIdentifier;
use der::{Any, Tag, Tagged};

use crate::asn1::{decode_sequence, decode_value, encode_any, encode_sequence};
use crate::config::FormatLimits;
use crate::error::{DecodeError, DecodeResult};
use crate::x509::attributes::Attributes;

use super::ExtensionData;

/// ```text
/// BasicConstraints ::= SEQUENCE {
///      cA                      BOOLEAN DEFAULT FALSE,
///      pathLenConstraint       INTEGER (0..MAX) OPTIONAL }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicConstraintsExtensionData {
    critical: bool,
    ca: bool,
    path_len: Option<u32>,
}

impl BasicConstraintsExtensionData {
    pub const OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.19");
    pub const NAME: &'static str = "BasicConstraints";

    #[must_use]
    pub fn new(critical: bool, ca: bool, path_len: Option<u32>) -> Self {
        Self { critical, ca, path_len }
    }

    /// Constraints of an end entity.
    #[must_use]
    pub fn end_entity() -> Self {
        Self::new(true, false, None)
    }

    #[must_use]
    pub fn ca(&self) -> bool {
        self.ca
    }

    #[must_use]
    pub fn path_len(&self) -> Option<u32> {
        self.path_len
    }

    /// `-1` when not a CA, the path length, or `i32::MAX` when unlimited.
    #[must_use]
    pub fn path_len_constraint(&self) -> i32 {
        match (self.ca, self.path_len) {
            (false, _) => -1,
            (true, Some(len)) => i32::try_from(len).unwrap_or(i32::MAX),
            (true, None) => i32::MAX,
        }
    }

    pub fn decode(any: &Any, critical: bool) -> DecodeResult<Self> {
        let elements = decode_sequence(any, 0, 2)?;
        let mut remaining = elements.iter().peekable();

        let ca = match remaining.peek() {
            Some(&element) if element.tag() == Tag::Boolean => {
                remaining.next();
                decode_value::<bool>(element).map_err(|e| e.within("cA"))?
            }
            _ => false,
        };
        let path_len = match remaining.next() {
            Some(element) if element.tag() == Tag::Integer => {
                Some(decode_value::<u32>(element).map_err(|e| e.within("pathLenConstraint"))?)
            }
            Some(element) => {
                return Err(DecodeError::unexpected_tag("pathLenConstraint", Tag::Integer, element.tag()));
            }
            None => None,
        };
        Ok(Self { critical, ca, path_len })
    }
}

impl ExtensionData for BasicConstraintsExtensionData {
    fn oid(&self) -> ObjectIdentifier {
        Self::OID
    }

    fn critical(&self) -> bool {
        self.critical
    }

    fn encode(&self) -> DecodeResult<Any> {
        let mut elements = Vec::new();

        // DEFAULT FALSE is omitted in DER
        if self.ca {
            elements.push(encode_any(&true)?);
        }
        if let Some(len) = self.path_len {
            elements.push(encode_any(&len)?);
        }
        encode_sequence(&elements)
    }

    fn to_value_string(&self, _limits: &FormatLimits) -> String {
        match (self.ca, self.path_len) {
            (true, Some(len)) => format!("CA:true, pathlen:{len}"),
            (true, None) => "CA:true".to_string(),
            (false, _) => "CA:false".to_string(),
        }
    }

    fn add_details(&self, attributes: &mut Attributes, _limits: &FormatLimits) {
        attributes.add("CA", Some(self.ca.to_string()));
        if let Some(len) = self.path_len {
            attributes.add("Path length", Some(len.to_string()));
        }
    }
}
