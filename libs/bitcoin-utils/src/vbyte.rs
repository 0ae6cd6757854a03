//! Per-script-class input vbyte costs used by the fee estimator
//!. These are fixed approximations (signature + witness
//! overhead folded in) rather than exact per-transaction vbyte counts,
//! matching the estimator's stated tolerance for overpaying fees
//! slightly in exchange for a single constant-time lookup per input.

use bitcoin::Script;

use crate::address::extract_standard_script_hash;
use crate::address::StandardScriptHash;

pub const P2WPKH_INPUT_VBYTES: u64 = 69;
pub const TAPROOT_INPUT_VBYTES: u64 = 58;
pub const P2SH_INPUT_VBYTES: u64 = 109;
pub const P2WSH_INPUT_VBYTES: u64 = 140;
pub const P2PKH_INPUT_VBYTES: u64 = 148;

/// Taproot output: `OP_1 <32 bytes>`.
fn is_p2tr(bytes: &[u8]) -> bool {
    bytes.len() == 34 && bytes[0] == 0x51 && bytes[1] == 0x20
}

/// Estimated vbyte cost of spending an input whose previous output had
/// scriptPubKey `prev_script_pubkey`. Unrecognized (non-standard)
/// scripts fall back to the most conservative (largest) class, P2WSH,
/// since the commitment engine's own funding outputs are P2WSH and
/// that is the shape most likely to appear among unrecognized inputs
/// in a multi-payer raise.
pub fn input_vbytes_for_script_pubkey(prev_script_pubkey: &Script) -> u64 {
    if is_p2tr(prev_script_pubkey.as_bytes()) {
        return TAPROOT_INPUT_VBYTES;
    }

    match extract_standard_script_hash(prev_script_pubkey) {
        Some(StandardScriptHash::P2wpkh(_)) => P2WPKH_INPUT_VBYTES,
        Some(StandardScriptHash::P2sh(_)) => P2SH_INPUT_VBYTES,
        Some(StandardScriptHash::P2wsh(_)) => P2WSH_INPUT_VBYTES,
        Some(StandardScriptHash::P2pkh(_)) => P2PKH_INPUT_VBYTES,
        None => P2WSH_INPUT_VBYTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::build_hash_lock_script;
    use crate::address::p2wsh_script_pubkey;
    use bitcoin::ScriptBuf;

    #[test]
    fn p2wsh_output_maps_to_p2wsh_vbytes() {
        let redeem = build_hash_lock_script(&[0x44u8; 32]);
        let spk = p2wsh_script_pubkey(&redeem);
        assert_eq!(input_vbytes_for_script_pubkey(&spk), P2WSH_INPUT_VBYTES);
    }

    #[test]
    fn taproot_output_maps_to_taproot_vbytes() {
        let mut bytes = vec![0x51, 0x20];
        bytes.extend_from_slice(&[0u8; 32]);
        let spk = ScriptBuf::from(bytes);
        assert_eq!(input_vbytes_for_script_pubkey(&spk), TAPROOT_INPUT_VBYTES);
    }

    #[test]
    fn unrecognized_script_falls_back_to_p2wsh() {
        let spk = ScriptBuf::from(vec![0x6a, 0x02, 0xde, 0xad]);
        assert_eq!(input_vbytes_for_script_pubkey(&spk), P2WSH_INPUT_VBYTES);
    }
}
