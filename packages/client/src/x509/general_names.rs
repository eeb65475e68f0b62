use std::fmt;

use der::{Any, Tag, Tagged};

use crate::asn1::{decode_elements, decode_sequence, decode_tagged, encode_constructed, encode_sequence};
use crate::config::FormatLimits;
use crate::error::{DecodeError, DecodeResult};

use super::attributes::{join_limited, Attributes, AttributesContent};
use super::general_name::GeneralName;

/// Ordered sequence of general names; order and duplicates are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralNames {
    names: Vec<GeneralName>,
}

impl GeneralNames {
    pub fn new(names: Vec<GeneralName>) -> Self {
        Self { names }
    }

    #[must_use]
    pub fn names(&self) -> &[GeneralName] {
        &self.names
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneralName> {
        self.names.iter()
    }

    pub fn push(&mut self, name: GeneralName) {
        self.names.push(name);
    }

    /// Decode a `GeneralNames ::= SEQUENCE OF GeneralName`.
    pub fn decode(any: &Any) -> DecodeResult<Self> {
        Self::from_elements(decode_sequence(any, 0, usize::MAX)?)
    }

    /// Decode an implicitly tagged `[number] GeneralNames`.
    pub fn decode_implicit(any: &Any, number: u8) -> DecodeResult<Self> {
        let tagged = decode_tagged(any, number)?;

        if !tagged.tag().is_constructed() {
            return Err(DecodeError::new("", format!("[{number}] GeneralNames must be constructed")));
        }
        Self::from_elements(decode_elements(tagged.value())?)
    }

    fn from_elements(elements: Vec<Any>) -> DecodeResult<Self> {
        let names = elements
            .iter()
            .enumerate()
            .map(|(index, element)| GeneralName::decode(element).map_err(|e| e.within(&format!("[{index}]"))))
            .collect::<DecodeResult<Vec<_>>>()?;

        Ok(Self { names })
    }

    pub fn encode(&self) -> DecodeResult<Any> {
        encode_sequence(&self.encoded_names()?)
    }

    pub fn encode_implicit(&self, number: u8) -> DecodeResult<Any> {
        let tag = Tag::ContextSpecific {
            constructed: true,
            number: der::TagNumber::new(number),
        };
        encode_constructed(tag, &self.encoded_names()?)
    }

    fn encoded_names(&self) -> DecodeResult<Vec<Any>> {
        self.names.iter().map(GeneralName::encode).collect()
    }

    /// Display form joined with `", "` and truncated at `limit`.
    #[must_use]
    pub fn to_value_string(&self, limit: usize) -> String {
        join_limited(self.names.iter().map(ToString::to_string), limit)
    }
}

impl fmt::Display for GeneralNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_limited(self.names.iter().map(ToString::to_string), usize::MAX))
    }
}

impl AttributesContent for GeneralNames {
    fn add_to_attributes(&self, attributes: &mut Attributes, limits: &FormatLimits) {
        for (index, name) in self.names.iter().enumerate() {
            let mut value = name.value_string();
            if value.chars().count() > limits.long {
                value = join_limited([value], limits.long);
            }
            attributes.add(format!("{} [{index}]", name.name_type().label()), Some(value));
        }
    }
}

impl From<Vec<GeneralName>> for GeneralNames {
    fn from(names: Vec<GeneralName>) -> Self {
        Self::new(names)
    }
}

#[cfg(test)]
mod tests {
    use der::{Decode, Encode};

    use super::*;

    fn sample() -> GeneralNames {
        GeneralNames::new(vec![
            GeneralName::Dns("b.example.org".to_string()),
            GeneralName::Dns("a.example.org".to_string()),
            GeneralName::Dns("a.example.org".to_string()),
            GeneralName::IpAddress(vec![127, 0, 0, 1]),
        ])
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let names = sample();
        let bytes = names.encode().unwrap().to_der().unwrap();
        let decoded = GeneralNames::decode(&Any::from_der(&bytes).unwrap()).unwrap();

        assert_eq!(decoded, names);
        assert_eq!(decoded.names().len(), 4);
    }

    #[test]
    fn test_implicit_round_trip() {
        let names = sample();
        let tagged = names.encode_implicit(0).unwrap();

        assert_eq!(tagged.to_der().unwrap()[0], 0xa0);
        assert_eq!(GeneralNames::decode_implicit(&tagged, 0).unwrap(), names);
        assert!(GeneralNames::decode_implicit(&tagged, 2).is_err());
    }

    #[test]
    fn test_error_context_names_index() {
        let bad = encode_sequence(&[
            GeneralName::Dns("ok".to_string()).encode().unwrap(),
            Any::new(Tag::Boolean, vec![0xff]).unwrap(),
        ])
        .unwrap();

        let err = GeneralNames::decode(&bad).unwrap_err();
        assert_eq!(err.context(), "[1]");
    }

    #[test]
    fn test_value_string_truncates() {
        assert_eq!(
            sample().to_value_string(40),
            "DNS:b.example.org, DNS:a.example.org, ..."
        );
    }
}
