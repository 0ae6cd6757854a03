//! P2WSH address derivation and script-hash extraction, used by the
//! commitment builder (to derive the funding address callers pay into)
//! and by the oracle reconciliation matcher's lowest-priority path:
//! matching a `SmartContractRecord` by its payout script's address or
//! hash.

use bitcoin::script::PushBytes;
use bitcoin::{Address, Network, Script, ScriptBuf};

use crate::hash::{hash160, sha256};
use starlight_types::BitcoinNetwork;

fn to_bitcoin_network(network: BitcoinNetwork) -> Network {
    network.as_bitcoin_network()
}

/// Derives the P2WSH address that funds flow into for a given redeem
/// script (the hash-lock script built by [`crate::script::build_hash_lock_script`]).
pub fn p2wsh_address(redeem_script: &Script, network: BitcoinNetwork) -> Address {
    Address::p2wsh(redeem_script, to_bitcoin_network(network))
}

/// The scriptPubKey a P2WSH output pays to for a given redeem script:
/// `OP_0 <SHA-256(redeem_script)>`.
pub fn p2wsh_script_pubkey(redeem_script: &Script) -> ScriptBuf {
    ScriptBuf::new_p2wsh(&redeem_script.wscript_hash())
}

/// Parses a human-readable address string into its scriptPubKey,
/// validating it against the expected network.
pub fn script_pubkey_for_address(address: &str, network: BitcoinNetwork) -> crate::Result<ScriptBuf> {
    let parsed = address
        .parse::<Address<bitcoin::address::NetworkUnchecked>>()
        .map_err(|e| crate::BitcoinUtilsError::InvalidAddress(e.to_string()))?
        .require_network(to_bitcoin_network(network))
        .map_err(|e| crate::BitcoinUtilsError::InvalidAddress(e.to_string()))?;
    Ok(parsed.script_pubkey())
}

/// The standard script-hash forms the oracle matcher looks for when a
/// `SmartContractRecord`'s payout script is compared against a
/// funding transaction's output scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardScriptHash {
    P2sh([u8; 20]),
    P2wsh([u8; 32]),
    P2wpkh([u8; 20]),
    P2pkh([u8; 20]),
}

/// Extracts the standard hash committed to by a scriptPubKey, if it
/// matches one of the well-known output templates. Returns `None` for
/// non-standard scripts (e.g. bare multisig, taproot).
pub fn extract_standard_script_hash(script_pubkey: &Script) -> Option<StandardScriptHash> {
    let bytes = script_pubkey.as_bytes();

    // P2WSH: OP_0 <32 bytes>
    if bytes.len() == 34 && bytes[0] == 0x00 && bytes[1] == 0x20 {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);
        return Some(StandardScriptHash::P2wsh(hash));
    }

    // P2WPKH: OP_0 <20 bytes>
    if bytes.len() == 22 && bytes[0] == 0x00 && bytes[1] == 0x14 {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&bytes[2..22]);
        return Some(StandardScriptHash::P2wpkh(hash));
    }

    // P2SH: OP_HASH160 <20 bytes> OP_EQUAL
    if bytes.len() == 23 && bytes[0] == 0xa9 && bytes[1] == 0x14 && bytes[22] == 0x87 {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&bytes[2..22]);
        return Some(StandardScriptHash::P2sh(hash));
    }

    // P2PKH: OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
    if bytes.len() == 25
        && bytes[0] == 0x76
        && bytes[1] == 0xa9
        && bytes[2] == 0x14
        && bytes[23] == 0x88
        && bytes[24] == 0xac
    {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&bytes[3..23]);
        return Some(StandardScriptHash::P2pkh(hash));
    }

    None
}

/// `SHA-256(redeem_script)`, matching `Script::wscript_hash` but exposed
/// directly for callers outside the `bitcoin` crate's type system (e.g.
/// when comparing against a hash recovered from JSON).
pub fn wscript_hash(redeem_script: &Script) -> [u8; 32] {
    sha256(redeem_script.as_bytes())
}

/// `HASH160(pubkey_or_script)` convenience wrapper, named for the
/// standard-address context callers use it in.
pub fn hash160_of(data: &[u8]) -> [u8; 20] {
    hash160(data)
}

/// Whether `data` is a syntactically valid push for a P2WSH witness
/// program (exactly 32 bytes) — used when validating redeem scripts
/// before they're wrapped with [`p2wsh_script_pubkey`].
pub fn is_valid_wscript_push(data: &PushBytes) -> bool {
    data.len() == 32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::build_hash_lock_script;

    #[test]
    fn p2wsh_address_is_deterministic_for_a_given_script() {
        let redeem = build_hash_lock_script(&[0x11u8; 32]);
        let a = p2wsh_address(&redeem, BitcoinNetwork::Mainnet);
        let b = p2wsh_address(&redeem, BitcoinNetwork::Mainnet);
        assert_eq!(a, b);
    }

    #[test]
    fn p2wsh_address_differs_across_networks() {
        let redeem = build_hash_lock_script(&[0x22u8; 32]);
        let mainnet = p2wsh_address(&redeem, BitcoinNetwork::Mainnet);
        let testnet = p2wsh_address(&redeem, BitcoinNetwork::Testnet);
        assert_ne!(mainnet.to_string(), testnet.to_string());
    }

    #[test]
    fn extract_standard_script_hash_recognizes_p2wsh() {
        let redeem = build_hash_lock_script(&[0x33u8; 32]);
        let spk = p2wsh_script_pubkey(&redeem);
        match extract_standard_script_hash(&spk) {
            Some(StandardScriptHash::P2wsh(hash)) => assert_eq!(hash, wscript_hash(&redeem)),
            other => panic!("expected P2wsh, got {other:?}"),
        }
    }

    #[test]
    fn extract_standard_script_hash_rejects_non_standard() {
        let op_return = crate::script::build_op_return_script(b"hi").unwrap();
        assert!(extract_standard_script_hash(&op_return).is_none());
    }
}
