use starlight_types::{BlockHeader, Transaction};

use crate::cursor::Cursor;
use crate::error::Result;
use crate::header::{parse_header, HEADER_LEN};
use crate::tx::parse_transaction;

/// Parses a full raw P2P block: 80-byte header, varint tx count, then
/// that many transactions. Trailing bytes after the declared
/// transaction count are an error — they would indicate either a
/// corrupt fetch or a tx count the parser under-read.
pub fn parse_block(raw: &[u8]) -> Result<(BlockHeader, Vec<Transaction>)> {
    let header = parse_header(raw)?;

    let mut cursor = Cursor::new(&raw[HEADER_LEN..]);
    let tx_count = cursor.varint_usize("block.tx_count")?;
    let mut transactions = Vec::with_capacity(tx_count);
    for _ in 0..tx_count {
        transactions.push(parse_transaction(&mut cursor)?);
    }

    if cursor.remaining() != 0 {
        return Err(crate::error::ParseError::TrailingBytes(cursor.remaining()));
    }

    Ok((header, transactions))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block_bytes() -> Vec<u8> {
        let mut b = vec![0u8; HEADER_LEN];
        b.push(0x01); // tx count = 1
        b.extend_from_slice(&1i32.to_le_bytes()); // tx version
        b.push(0x01); // vin count
        b.extend_from_slice(&[0u8; 32]);
        b.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes()); // prev_index
        b.push(0x00); // empty scriptSig
        b.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes()); // sequence
        b.push(0x01); // vout count
        b.extend_from_slice(&5_000_000_000u64.to_le_bytes());
        b.push(0x00);
        b.extend_from_slice(&0u32.to_le_bytes()); // locktime
        b
    }

    #[test]
    fn parses_single_coinbase_like_block() {
        let bytes = sample_block_bytes();
        let (header, txs) = parse_block(&bytes).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(header.version, 0);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = sample_block_bytes();
        bytes.push(0xFF);
        assert!(matches!(
            parse_block(&bytes),
            Err(crate::error::ParseError::TrailingBytes(1))
        ));
    }
}
