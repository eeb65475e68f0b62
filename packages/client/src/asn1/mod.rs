//! ASN.1 primitive layer
//!
//! Generic decode/encode helpers for tagged and sequence structures on top of
//! `der::Any`. Every typed object of the extension model is built from these.

use der::{Any, Decode, DecodeOwned, Encode, Reader, SliceReader, Tag, TagNumber, Tagged};

use crate::error::{DecodeError, DecodeResult};

pub mod oid;

pub use oid::{oid_display, oid_label, parse_oid};

/// Parse a single DER element, requiring the input to be fully consumed.
pub fn decode_any(bytes: &[u8]) -> DecodeResult<Any> {
    Ok(Any::from_der(bytes)?)
}

/// Parse a concatenation of DER elements (the content of a constructed value).
pub fn decode_elements(content: &[u8]) -> DecodeResult<Vec<Any>> {
    let mut reader = SliceReader::new(content)?;
    let mut elements = Vec::new();

    while !reader.is_finished() {
        let element = Any::decode(&mut reader)
            .map_err(|e| DecodeError::from(e).within(&format!("[{}]", elements.len())))?;
        elements.push(element);
    }
    Ok(elements)
}

/// Decode a SEQUENCE and check its element count lies within `[min, max]`.
pub fn decode_sequence(any: &Any, min: usize, max: usize) -> DecodeResult<Vec<Any>> {
    if any.tag() != Tag::Sequence {
        return Err(DecodeError::unexpected_tag("", Tag::Sequence, any.tag()));
    }

    let elements = decode_elements(any.value())?;

    if elements.len() < min || elements.len() > max {
        return Err(DecodeError::new(
            "",
            format!(
                "sequence length {} outside of [{min}, {}]",
                elements.len(),
                if max == usize::MAX { "MAX".to_string() } else { max.to_string() }
            ),
        ));
    }
    Ok(elements)
}

/// Context-specific tag number of an element, if it is context-specific at all.
#[must_use]
pub fn context_tag(any: &Any) -> Option<u8> {
    match any.tag() {
        Tag::ContextSpecific { number, .. } => Some(number.value()),
        _ => None,
    }
}

/// Check that an element carries the given context-specific tag number.
pub fn decode_tagged(any: &Any, number: u8) -> DecodeResult<&Any> {
    match context_tag(any) {
        Some(actual) if actual == number => Ok(any),
        _ => Err(DecodeError::unexpected_tag(
            "",
            format!("[{number}]"),
            any.tag(),
        )),
    }
}

/// Reinterpret an implicitly tagged element as the universal type `T`.
pub fn decode_implicit<T: DecodeOwned>(any: &Any, number: u8, universal: Tag) -> DecodeResult<T> {
    let tagged = decode_tagged(any, number)?;
    let retagged = Any::new(universal, tagged.value().to_vec())?;

    Ok(T::from_der(&retagged.to_der()?)?)
}

/// Decode a generic element as the universal type `T`.
pub fn decode_value<T: DecodeOwned>(any: &Any) -> DecodeResult<T> {
    Ok(T::from_der(&any.to_der()?)?)
}

/// Decode the single element wrapped by an explicitly tagged element.
pub fn decode_explicit(any: &Any, number: u8) -> DecodeResult<Any> {
    let tagged = decode_tagged(any, number)?;

    if !tagged.tag().is_constructed() {
        return Err(DecodeError::new("", format!("explicit tag [{number}] must be constructed")));
    }
    decode_any(tagged.value())
}

/// Convert any encodable value into its generic element form.
pub fn encode_any<T: Encode>(value: &T) -> DecodeResult<Any> {
    Ok(Any::from_der(&value.to_der()?)?)
}

/// Encode a SEQUENCE from already encoded elements.
pub fn encode_sequence(elements: &[Any]) -> DecodeResult<Any> {
    encode_constructed(Tag::Sequence, elements)
}

/// Encode a constructed element of the given tag from already encoded elements.
pub fn encode_constructed(tag: Tag, elements: &[Any]) -> DecodeResult<Any> {
    let mut content = Vec::new();

    for element in elements {
        element.encode_to_vec(&mut content)?;
    }
    Ok(Any::new(tag, content)?)
}

/// Build a context-specific tagged element around raw content.
pub fn encode_tagged(number: u8, constructed: bool, content: &[u8]) -> DecodeResult<Any> {
    let tag = Tag::ContextSpecific {
        constructed,
        number: TagNumber::new(number),
    };
    Ok(Any::new(tag, content.to_vec())?)
}

/// Implicitly tag an encodable value (the universal tag is replaced).
pub fn encode_implicit<T: Encode>(number: u8, value: &T) -> DecodeResult<Any> {
    let universal = encode_any(value)?;

    encode_tagged(number, universal.tag().is_constructed(), universal.value())
}

/// Explicitly tag an element (the element is wrapped, tag preserved).
pub fn encode_explicit(number: u8, element: &Any) -> DecodeResult<Any> {
    encode_tagged(number, true, &element.to_der()?)
}

#[cfg(test)]
mod tests {
    use der::asn1::{Ia5String, ObjectIdentifier};

    use super::*;

    #[test]
    fn test_sequence_bounds() {
        let oid = ObjectIdentifier::new_unwrap("2.5.29.19");
        let sequence = encode_sequence(&[encode_any(&oid).unwrap()]).unwrap();

        assert_eq!(decode_sequence(&sequence, 1, 1).unwrap().len(), 1);

        let err = decode_sequence(&sequence, 2, usize::MAX).unwrap_err();
        assert!(err.message().contains("outside of [2, MAX]"));
    }

    #[test]
    fn test_sequence_rejects_other_tags() {
        let oid = encode_any(&ObjectIdentifier::new_unwrap("1.2.3")).unwrap();
        assert!(decode_sequence(&oid, 0, usize::MAX).is_err());
    }

    #[test]
    fn test_implicit_round_trip() {
        let value = Ia5String::new("example.org").unwrap();
        let tagged = encode_implicit(2, &value).unwrap();

        assert_eq!(context_tag(&tagged), Some(2));
        assert!(!tagged.tag().is_constructed());

        let decoded: Ia5String = decode_implicit(&tagged, 2, Tag::Ia5String).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_tag_mismatch_is_error() {
        let value = Ia5String::new("example.org").unwrap();
        let tagged = encode_implicit(2, &value).unwrap();

        let err = decode_tagged(&tagged, 6).unwrap_err();
        assert!(err.message().contains("expected [6]"));
    }

    #[test]
    fn test_explicit_round_trip() {
        let oid = encode_any(&ObjectIdentifier::new_unwrap("1.2.3.4")).unwrap();
        let tagged = encode_explicit(0, &oid).unwrap();

        assert!(tagged.tag().is_constructed());
        assert_eq!(decode_explicit(&tagged, 0).unwrap(), oid);
    }
}
