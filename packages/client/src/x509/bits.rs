//! Named bit string helpers (KeyUsage, ReasonFlags)

use der::asn1::BitString;

use crate::error::{DecodeError, DecodeResult};

/// Collect the positions of all set bits (bit 0 is the most significant bit
/// of the first byte).
#[must_use]
pub fn set_bits(bits: &BitString) -> Vec<usize> {
    let bytes = bits.raw_bytes();
    let bit_len = bits.bit_len();

    (0..bit_len)
        .filter(|&position| bytes[position / 8] & (0x80 >> (position % 8)) != 0)
        .collect()
}

/// Map the set bits onto their names; positions without a name are rejected.
pub fn named_bits<T: Copy>(bits: &BitString, names: &[T]) -> DecodeResult<Vec<T>> {
    set_bits(bits)
        .into_iter()
        .map(|bit| {
            names
                .get(bit)
                .copied()
                .ok_or_else(|| DecodeError::new("", format!("undefined named bit {bit}")))
        })
        .collect()
}

/// Build the DER form of a named bit string: trailing zero bits are dropped.
pub fn named_bit_string(positions: impl IntoIterator<Item = usize>) -> DecodeResult<BitString> {
    let positions: Vec<usize> = positions.into_iter().collect();

    let Some(highest) = positions.iter().copied().max() else {
        return Ok(BitString::new(0, Vec::new())?);
    };

    let mut bytes = vec![0u8; highest / 8 + 1];

    for position in positions {
        bytes[position / 8] |= 0x80 >> (position % 8);
    }
    // highest % 8 < 8, so the cast cannot truncate
    let unused = (7 - highest % 8) as u8;

    Ok(BitString::new(unused, bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_encoding() {
        let bits = named_bit_string([0, 5]).unwrap();

        assert_eq!(bits.raw_bytes(), &[0x84]);
        assert_eq!(bits.unused_bits(), 2);
        assert_eq!(set_bits(&bits), vec![0, 5]);
    }

    #[test]
    fn test_second_byte() {
        let bits = named_bit_string([8]).unwrap();

        assert_eq!(bits.raw_bytes(), &[0x00, 0x80]);
        assert_eq!(bits.unused_bits(), 7);
        assert_eq!(set_bits(&bits), vec![8]);
    }

    #[test]
    fn test_empty() {
        let bits = named_bit_string([]).unwrap();
        assert!(set_bits(&bits).is_empty());
    }

    #[test]
    fn test_named_bits_rejects_undefined_positions() {
        let names = ['a', 'b', 'c'];

        assert_eq!(named_bits(&named_bit_string([0, 2]).unwrap(), &names).unwrap(), vec!['a', 'c']);

        let err = named_bits(&named_bit_string([1, 9]).unwrap(), &names).unwrap_err();
        assert_eq!(err.message(), "undefined named bit 9");
    }
}
