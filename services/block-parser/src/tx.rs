use starlight_types::{Transaction, TxInput, TxOutput};

use crate::cursor::Cursor;
use crate::error::Result;

const SEGWIT_MARKER: u8 = 0x00;
const SEGWIT_FLAG: u8 = 0x01;

/// Parses one transaction starting at the cursor's current position,
/// leaving the cursor positioned just past it. Detects the SegWit
/// marker/flag pair immediately after the version field and, when
/// present, reads one witness stack per input after the outputs:
/// version → [marker, flag] → vin count → inputs → vout count →
/// outputs → (if segwit) per-input witness stacks → locktime.
pub fn parse_transaction(cursor: &mut Cursor) -> Result<Transaction> {
    let version = cursor.i32_le("tx.version")?;

    let has_witness = {
        // Peek without consuming unless it really is marker+flag: a
        // varint vin-count of 0x00 is illegal (no inputs) but we must
        // not misparse a legitimate small vin count as a marker.
        let remaining_start = cursor.pos();
        let maybe_marker = cursor.take(1, "tx.segwit_marker");
        match maybe_marker {
            Ok(&[SEGWIT_MARKER]) => {
                let flag = cursor.take(1, "tx.segwit_flag")?;
                if flag == [SEGWIT_FLAG] {
                    true
                } else {
                    return Err(crate::error::ParseError::Truncated {
                        field: "tx.segwit_flag",
                        offset: remaining_start,
                    });
                }
            }
            _ => {
                cursor.set_pos(remaining_start);
                false
            }
        }
    };

    let vin_count = cursor.varint_usize("tx.vin_count")?;
    let mut inputs = Vec::with_capacity(vin_count);
    for _ in 0..vin_count {
        let prev_txid = cursor.array32("tx.input.prev_txid")?;
        let prev_index = cursor.u32_le("tx.input.prev_index")?;
        let script_len = cursor.varint_usize("tx.input.script_len")?;
        let script_sig = cursor.take(script_len, "tx.input.script_sig")?.to_vec();
        let sequence = cursor.u32_le("tx.input.sequence")?;
        inputs.push(TxInput {
            prev_txid,
            prev_index,
            script_sig,
            sequence,
        });
    }

    let vout_count = cursor.varint_usize("tx.vout_count")?;
    let mut outputs = Vec::with_capacity(vout_count);
    for _ in 0..vout_count {
        let value = cursor.u64_le("tx.output.value")?;
        let script_len = cursor.varint_usize("tx.output.script_len")?;
        let script_pubkey = cursor.take(script_len, "tx.output.script_pubkey")?.to_vec();
        outputs.push(TxOutput { value, script_pubkey });
    }

    let mut witnesses = vec![Vec::new(); inputs.len()];
    if has_witness {
        for witness in witnesses.iter_mut() {
            let item_count = cursor.varint_usize("tx.witness.item_count")?;
            let mut stack = Vec::with_capacity(item_count);
            for _ in 0..item_count {
                let item_len = cursor.varint_usize("tx.witness.item_len")?;
                stack.push(cursor.take(item_len, "tx.witness.item")?.to_vec());
            }
            *witness = stack;
        }
    }

    let locktime = cursor.u32_le("tx.locktime")?;

    let legacy = serialize_legacy(version, &inputs, &outputs, locktime);
    let txid = starlight_types::sha256d(&legacy);

    Ok(Transaction {
        version,
        inputs,
        outputs,
        locktime,
        has_witness,
        witnesses,
        txid,
    })
}

/// `version || vin || vout || locktime` with no witness data — the
/// exact bytes the canonical txid is double-SHA-256'd over.
pub fn serialize_legacy(version: i32, inputs: &[TxInput], outputs: &[TxOutput], locktime: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&bitcoin_utils::varint::write_varint(inputs.len() as u64));
    for input in inputs {
        out.extend_from_slice(&input.prev_txid);
        out.extend_from_slice(&input.prev_index.to_le_bytes());
        out.extend_from_slice(&bitcoin_utils::varint::write_varint(input.script_sig.len() as u64));
        out.extend_from_slice(&input.script_sig);
        out.extend_from_slice(&input.sequence.to_le_bytes());
    }
    out.extend_from_slice(&bitcoin_utils::varint::write_varint(outputs.len() as u64));
    for output in outputs {
        out.extend_from_slice(&output.value.to_le_bytes());
        out.extend_from_slice(&bitcoin_utils::varint::write_varint(output.script_pubkey.len() as u64));
        out.extend_from_slice(&output.script_pubkey);
    }
    out.extend_from_slice(&locktime.to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_tx_bytes() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&1i32.to_le_bytes()); // version
        b.push(0x01); // vin count
        b.extend_from_slice(&[0xAAu8; 32]); // prev txid
        b.extend_from_slice(&0u32.to_le_bytes()); // prev index
        b.push(0x00); // empty scriptSig
        b.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes()); // sequence
        b.push(0x01); // vout count
        b.extend_from_slice(&1000u64.to_le_bytes()); // value
        b.push(0x00); // empty script
        b.extend_from_slice(&0u32.to_le_bytes()); // locktime
        b
    }

    #[test]
    fn parses_non_segwit_transaction() {
        let bytes = legacy_tx_bytes();
        let mut cursor = Cursor::new(&bytes);
        let tx = parse_transaction(&mut cursor).unwrap();
        assert!(!tx.has_witness);
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(cursor.pos(), bytes.len());
    }

    #[test]
    fn parses_segwit_transaction_with_witness_after_outputs() {
        let mut b = Vec::new();
        b.extend_from_slice(&2i32.to_le_bytes());
        b.push(0x00); // marker
        b.push(0x01); // flag
        b.push(0x01); // vin count
        b.extend_from_slice(&[0xBBu8; 32]);
        b.extend_from_slice(&0u32.to_le_bytes());
        b.push(0x00);
        b.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        b.push(0x01); // vout count
        b.extend_from_slice(&500u64.to_le_bytes());
        b.push(0x00);
        // witness: 1 item of 2 bytes
        b.push(0x01);
        b.push(0x02);
        b.extend_from_slice(&[0x11, 0x22]);
        b.extend_from_slice(&0u32.to_le_bytes()); // locktime

        let mut cursor = Cursor::new(&b);
        let tx = parse_transaction(&mut cursor).unwrap();
        assert!(tx.has_witness);
        assert_eq!(tx.witnesses[0], vec![vec![0x11, 0x22]]);
    }

    #[test]
    fn txid_excludes_witness_data() {
        let legacy = legacy_tx_bytes();
        let mut cursor = Cursor::new(&legacy);
        let legacy_tx = parse_transaction(&mut cursor).unwrap();

        let mut segwit = Vec::new();
        segwit.extend_from_slice(&1i32.to_le_bytes());
        segwit.push(0x00);
        segwit.push(0x01);
        segwit.push(0x01);
        segwit.extend_from_slice(&[0xAAu8; 32]);
        segwit.extend_from_slice(&0u32.to_le_bytes());
        segwit.push(0x00);
        segwit.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        segwit.push(0x01);
        segwit.extend_from_slice(&1000u64.to_le_bytes());
        segwit.push(0x00);
        segwit.push(0x01); // 1 witness item
        segwit.push(0x01);
        segwit.push(0xFF);
        segwit.extend_from_slice(&0u32.to_le_bytes());

        let mut cursor2 = Cursor::new(&segwit);
        let segwit_tx = parse_transaction(&mut cursor2).unwrap();

        assert_eq!(legacy_tx.txid, segwit_tx.txid);
    }
}
