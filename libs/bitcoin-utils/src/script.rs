//! Script construction and low-level walking helpers shared by the
//! commitment builder, inscription extractor, and oracle reconciliation
//! matcher.

use bitcoin::blockdata::opcodes::all as op;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::ScriptBuf;

use crate::hash::sha256;
use crate::{BitcoinUtilsError, Result};

/// Builds an `OP_RETURN <data>` script, choosing the minimal pushdata
/// encoding for `data`'s length.
pub fn build_op_return_script(data: &[u8]) -> Result<ScriptBuf> {
    if data.len() > u32::MAX as usize {
        return Err(BitcoinUtilsError::ScriptError(
            "data too large for OP_RETURN".to_string(),
        ));
    }
    let push = PushBytesBuf::try_from(data.to_vec())
        .map_err(|e| BitcoinUtilsError::ScriptError(e.to_string()))?;
    Ok(Builder::new()
        .push_opcode(op::OP_RETURN)
        .push_slice(push)
        .into_script())
}

/// One item walked out of a raw script: either a data push or a bare
/// opcode. `data` is empty for bare opcodes (and for `OP_0`, which
/// pushes an empty array).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptItem {
    pub opcode: u8,
    pub data: Vec<u8>,
}

/// Tolerantly walks a script's bytes into a sequence of items,
/// following the same pushdata grammar witness items and scriptSigs
/// use. Stops (without erroring) at the first malformed push, since
/// callers are heuristically scanning attacker-controlled bytes for
/// envelope markers rather than validating consensus scripts.
pub fn scan_script(bytes: &[u8]) -> Vec<ScriptItem> {
    let mut items = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let opcode = bytes[i];
        match opcode {
            0x01..=0x4b => {
                let len = opcode as usize;
                let Some(data) = bytes.get(i + 1..i + 1 + len) else { break };
                items.push(ScriptItem { opcode, data: data.to_vec() });
                i += 1 + len;
            }
            0x4c => {
                // OP_PUSHDATA1: 1-byte length follows.
                let Some(&len) = bytes.get(i + 1) else { break };
                let len = len as usize;
                let Some(data) = bytes.get(i + 2..i + 2 + len) else { break };
                items.push(ScriptItem { opcode, data: data.to_vec() });
                i += 2 + len;
            }
            0x4d => {
                // OP_PUSHDATA2: 2-byte little-endian length follows.
                let Some(len_bytes) = bytes.get(i + 1..i + 3) else { break };
                let len = u16::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
                let Some(data) = bytes.get(i + 3..i + 3 + len) else { break };
                items.push(ScriptItem { opcode, data: data.to_vec() });
                i += 3 + len;
            }
            0x4e => {
                // OP_PUSHDATA4: 4-byte little-endian length follows.
                let Some(len_bytes) = bytes.get(i + 1..i + 5) else { break };
                let len = u32::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
                let Some(data) = bytes.get(i + 5..i + 5 + len) else { break };
                items.push(ScriptItem { opcode, data: data.to_vec() });
                i += 5 + len;
            }
            _ => {
                // Bare opcode (OP_0, OP_IF, OP_ENDIF, numeric pushes, …).
                items.push(ScriptItem { opcode, data: Vec::new() });
                i += 1;
            }
        }
    }

    items
}

/// Length in bytes of the pushdata header a given opcode carries, if
/// `opcode` is a push opcode at all.
fn pushdata_header_len(opcode: u8) -> Option<usize> {
    match opcode {
        0x01..=0x4b => Some(1),
        0x4c => Some(2),
        0x4d => Some(3),
        0x4e => Some(5),
        _ => None,
    }
}

/// If `data` begins with a pushdata opcode whose declared length
/// matches the remainder of the slice, returns the slice with that
/// header stripped. Used by inscription sanitization to undo a
/// leading pushdata wrapper left over from naive payload extraction.
pub fn strip_leading_pushdata_prefix(data: &[u8]) -> &[u8] {
    let Some(&opcode) = data.first() else { return data };
    let Some(header_len) = pushdata_header_len(opcode) else { return data };

    let declared_len = match opcode {
        0x01..=0x4b => opcode as usize,
        0x4c => match data.get(1) {
            Some(&b) => b as usize,
            None => return data,
        },
        0x4d => match data.get(1..3) {
            Some(b) => u16::from_le_bytes(b.try_into().unwrap()) as usize,
            None => return data,
        },
        0x4e => match data.get(1..5) {
            Some(b) => u32::from_le_bytes(b.try_into().unwrap()) as usize,
            None => return data,
        },
        _ => return data,
    };

    if data.len() == header_len + declared_len {
        &data[header_len..]
    } else {
        data
    }
}

/// Builds the hash-lock redeem script `OP_SHA256 <SHA-256(pixel_hash)> OP_EQUAL`.
///
/// Regression-critical: the script commits to `SHA-256(pixel_hash)`, not
/// `pixel_hash` itself — the preimage the sweep engine later reveals is
/// `pixel_hash`, and anyone who can produce it can spend the output.
pub fn build_hash_lock_script(pixel_hash: &[u8; 32]) -> ScriptBuf {
    let expected = sha256(pixel_hash);
    let push = PushBytesBuf::try_from(expected.to_vec()).expect("32 bytes fits a single push");
    Builder::new()
        .push_opcode(op::OP_SHA256)
        .push_slice(push)
        .push_opcode(op::OP_EQUAL)
        .into_script()
}

/// If `script` is exactly `OP_SHA256 <32 bytes> OP_EQUAL`, returns the
/// committed 32-byte hash. Used by the sweep engine to recover the
/// expected hash from a funding output's redeem script before it
/// attempts to reveal a preimage.
pub fn parse_hash_lock_script(script: &bitcoin::Script) -> Option<[u8; 32]> {
    let bytes = script.as_bytes();
    if bytes.len() != 35 {
        return None;
    }
    if bytes[0] != op::OP_SHA256.to_u8() || bytes[1] != 0x20 || bytes[34] != op::OP_EQUAL.to_u8() {
        return None;
    }
    let mut expected = [0u8; 32];
    expected.copy_from_slice(&bytes[2..34]);
    Some(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_op_return_script_small_push() {
        let data = vec![1, 2, 3, 4];
        let script = build_op_return_script(&data).unwrap();
        let bytes = script.as_bytes();
        assert_eq!(bytes[0], op::OP_RETURN.to_u8());
        assert_eq!(bytes[1], 4);
        assert_eq!(&bytes[2..], &data[..]);
    }

    #[test]
    fn scan_script_walks_direct_and_pushdata1_pushes() {
        let mut bytes = vec![0x03, b'o', b'r', b'd'];
        bytes.push(0x4c);
        bytes.push(2);
        bytes.extend_from_slice(b"hi");
        let items = scan_script(&bytes);
        assert_eq!(items[0].data, b"ord");
        assert_eq!(items[1].data, b"hi");
    }

    #[test]
    fn scan_script_yields_bare_opcodes_between_pushes() {
        // OP_FALSE OP_IF <push "ord"> OP_ENDIF
        let mut bytes = vec![0x00, 0x63];
        bytes.push(0x03);
        bytes.extend_from_slice(b"ord");
        bytes.push(0x68);
        let items = scan_script(&bytes);
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].opcode, 0x00);
        assert_eq!(items[1].opcode, 0x63);
        assert_eq!(items[2].data, b"ord");
        assert_eq!(items[3].opcode, 0x68);
    }

    #[test]
    fn strips_matching_direct_push_prefix() {
        let mut data = vec![0x05];
        data.extend_from_slice(b"hello");
        assert_eq!(strip_leading_pushdata_prefix(&data), b"hello");
    }

    #[test]
    fn leaves_non_matching_prefix_untouched() {
        let data = b"<svg>not a push".to_vec();
        assert_eq!(strip_leading_pushdata_prefix(&data), data.as_slice());
    }

    #[test]
    fn hash_lock_script_commits_to_sha256_of_preimage_not_preimage_itself() {
        let preimage = [0x42u8; 32];
        let script = build_hash_lock_script(&preimage);
        let bytes = script.as_bytes();

        assert_eq!(bytes.len(), 35);
        assert_eq!(bytes[0], op::OP_SHA256.to_u8());
        assert_eq!(bytes[1], 0x20);
        assert_eq!(bytes[34], op::OP_EQUAL.to_u8());

        let committed = &bytes[2..34];
        assert_eq!(committed, &sha256(&preimage));
        assert_ne!(committed, &preimage[..]);
    }

    #[test]
    fn parse_hash_lock_script_round_trips() {
        let preimage = [0x07u8; 32];
        let script = build_hash_lock_script(&preimage);
        let parsed = parse_hash_lock_script(&script).unwrap();
        assert_eq!(parsed, sha256(&preimage));
    }

    #[test]
    fn parse_hash_lock_script_rejects_other_shapes() {
        let not_a_lock = ScriptBuf::from(vec![0x51]);
        assert!(parse_hash_lock_script(&not_a_lock).is_none());
    }
}
