//! Bitcoin's `CompactSize`/varint encoding: a single byte for values
//! below 0xFD, otherwise a 0xFD/0xFE/0xFF prefix followed by a fixed-width
//! little-endian integer.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VarIntError {
    #[error("truncated stream reading varint at offset {0}")]
    Truncated(usize),
}

/// Reads a varint starting at `offset`. Returns the decoded value and
/// the offset of the next unread byte.
pub fn read_varint(bytes: &[u8], offset: usize) -> Result<(u64, usize), VarIntError> {
    let prefix = *bytes.get(offset).ok_or(VarIntError::Truncated(offset))?;
    match prefix {
        0xFD => {
            let end = offset + 3;
            let slice = bytes.get(offset + 1..end).ok_or(VarIntError::Truncated(offset))?;
            let value = u16::from_le_bytes(slice.try_into().unwrap()) as u64;
            Ok((value, end))
        }
        0xFE => {
            let end = offset + 5;
            let slice = bytes.get(offset + 1..end).ok_or(VarIntError::Truncated(offset))?;
            let value = u32::from_le_bytes(slice.try_into().unwrap()) as u64;
            Ok((value, end))
        }
        0xFF => {
            let end = offset + 9;
            let slice = bytes.get(offset + 1..end).ok_or(VarIntError::Truncated(offset))?;
            let value = u64::from_le_bytes(slice.try_into().unwrap());
            Ok((value, end))
        }
        small => Ok((small as u64, offset + 1)),
    }
}

/// Serializes `value` into its minimal varint encoding.
pub fn write_varint(value: u64) -> Vec<u8> {
    if value < 0xFD {
        vec![value as u8]
    } else if value <= 0xFFFF {
        let mut out = vec![0xFD];
        out.extend_from_slice(&(value as u16).to_le_bytes());
        out
    } else if value <= 0xFFFF_FFFF {
        let mut out = vec![0xFE];
        out.extend_from_slice(&(value as u32).to_le_bytes());
        out
    } else {
        let mut out = vec![0xFF];
        out.extend_from_slice(&value.to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_across_all_size_classes() {
        for value in [0u64, 0xFC, 0xFD, 0xFFFF, 0x1_0000, 0xFFFF_FFFF, 0x1_0000_0000, u64::MAX] {
            let encoded = write_varint(value);
            let (decoded, consumed) = read_varint(&encoded, 0).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, encoded.len());
        }
    }

    #[test]
    fn truncated_stream_is_an_error() {
        assert_eq!(read_varint(&[0xFD, 0x01], 0), Err(VarIntError::Truncated(0)));
        assert_eq!(read_varint(&[], 0), Err(VarIntError::Truncated(0)));
    }

    proptest::proptest! {
        #[test]
        fn prop_round_trip(value: u64) {
            let encoded = write_varint(value);
            let (decoded, consumed) = read_varint(&encoded, 0).unwrap();
            proptest::prop_assert_eq!(decoded, value);
            proptest::prop_assert_eq!(consumed, encoded.len());
        }
    }
}
