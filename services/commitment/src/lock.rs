//! Hash-lock commitment script: `OP_SHA256
//! <SHA-256(pixel_hash)> OP_EQUAL`. Re-exported from `bitcoin-utils`
//! since the sweep engine and the PSBT builder both need the exact
//! same script; this module is the commitment-domain-facing name for
//! it.

pub use bitcoin_utils::script::{build_hash_lock_script, parse_hash_lock_script};
pub use bitcoin_utils::address::{p2wsh_address, p2wsh_script_pubkey};

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::blockdata::opcodes::all as op;

    #[test]
    fn commitment_script_commits_to_hash_of_preimage() {
        let preimage = [0x42u8; 32];
        let script = build_hash_lock_script(&preimage);
        let bytes = script.as_bytes();
        assert_eq!(bytes.len(), 35);
        assert_eq!(bytes[0], op::OP_SHA256.to_u8());
        assert_eq!(bytes[1], 0x20);
        assert_eq!(bytes[34], op::OP_EQUAL.to_u8());
        assert_ne!(&bytes[2..34], &preimage[..]);
    }
}
