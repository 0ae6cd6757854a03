use starlight_types::BlockHeader;

use crate::cursor::Cursor;
use crate::error::Result;

pub const HEADER_LEN: usize = 80;

/// Parses the literal 80-byte block header and recomputes its hash
/// locally: "header hash is the double SHA-256 of the
/// literal 80-byte header."
pub fn parse_header(bytes: &[u8]) -> Result<BlockHeader> {
    let header_bytes = bytes.get(..HEADER_LEN).ok_or(crate::error::ParseError::Truncated {
        field: "header",
        offset: 0,
    })?;

    let mut cursor = Cursor::new(header_bytes);
    let version = cursor.i32_le("header.version")?;
    let prev_hash = cursor.array32("header.prev_hash")?;
    let merkle_root = cursor.array32("header.merkle_root")?;
    let timestamp = cursor.u32_le("header.timestamp")?;
    let bits = cursor.u32_le("header.bits")?;
    let nonce = cursor.u32_le("header.nonce")?;

    let hash = BlockHeader::compute_hash(header_bytes);

    Ok(BlockHeader {
        version,
        prev_hash,
        merkle_root,
        timestamp,
        bits,
        nonce,
        hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header_bytes() -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[0] = 0x01; // version = 1
        bytes
    }

    #[test]
    fn parses_version_and_recomputes_hash() {
        let bytes = sample_header_bytes();
        let header = parse_header(&bytes).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.hash, starlight_types::BlockHeader::compute_hash(&bytes));
    }

    #[test]
    fn truncated_header_is_an_error() {
        let bytes = vec![0u8; 40];
        assert!(parse_header(&bytes).is_err());
    }
}
