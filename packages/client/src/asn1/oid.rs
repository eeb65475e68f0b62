//! OID parsing and the global OID-to-label lookup

use const_oid::db::DB;
use der::asn1::ObjectIdentifier;

use crate::error::DecodeResult;

/// Parse a dotted OID string.
pub fn parse_oid(oid: &str) -> DecodeResult<ObjectIdentifier> {
    Ok(ObjectIdentifier::new(oid)?)
}

/// Human readable label for an OID, falling back to the numeric form.
#[must_use]
pub fn oid_label(oid: &ObjectIdentifier) -> String {
    DB.by_oid(oid)
        .map_or_else(|| oid.to_string(), ToString::to_string)
}

/// Label plus numeric form, e.g. `id-ce-keyUsage (2.5.29.15)`.
#[must_use]
pub fn oid_display(oid: &ObjectIdentifier) -> String {
    match DB.by_oid(oid) {
        Some(label) => format!("{label} ({oid})"),
        None => oid.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_labels() {
        let key_usage = parse_oid("2.5.29.15").unwrap();
        assert_ne!(oid_label(&key_usage), "2.5.29.15");
        assert!(oid_display(&key_usage).ends_with("(2.5.29.15)"));

        let private = parse_oid("1.3.6.1.4.1.99999.1").unwrap();
        assert_eq!(oid_label(&private), "1.3.6.1.4.1.99999.1");
        assert_eq!(oid_display(&private), "1.3.6.1.4.1.99999.1");
    }

    #[test]
    fn test_invalid_oid() {
        assert!(parse_oid("not an oid").is_err());
    }
}
