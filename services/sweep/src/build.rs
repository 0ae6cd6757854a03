//! Hash-lock sweep transaction assembly.

use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use std::str::FromStr;

use crate::error::{Result, SweepError};

pub const DUST_THRESHOLD: u64 = 546;

/// `witness_vbytes`: the weight of the `[preimage,
/// redeem_script]` witness stack, discounted to vbytes.
pub fn witness_vbytes(preimage: &[u8], redeem_script: &[u8]) -> u64 {
    let mut witness = Witness::new();
    witness.push(preimage);
    witness.push(redeem_script);
    let encoded_len = bitcoin::consensus::encode::serialize(&witness).len() as u64;
    (encoded_len + 3) / 4
}

/// `fee = fee_rate * (10 + witness_vbytes + 34)`.
pub fn sweep_fee(fee_rate: u64, preimage: &[u8], redeem_script: &[u8]) -> u64 {
    fee_rate * (10 + witness_vbytes(preimage, redeem_script) + 34)
}

/// Assembles the hash-lock sweep transaction: one input
/// spending `(txid, vout)`, one output paying `donation_script_pubkey`
/// the previous value minus fee, witness = `[preimage, redeem_script]`.
pub fn build_sweep_transaction(
    txid: &str,
    vout: u32,
    prev_value: u64,
    preimage: &[u8; 32],
    redeem_script: &ScriptBuf,
    donation_script_pubkey: ScriptBuf,
    fee_rate: u64,
) -> Result<Transaction> {
    let fee = sweep_fee(fee_rate, preimage, redeem_script.as_bytes());
    let out_value = prev_value.checked_sub(fee).ok_or(SweepError::DustAfterFee)?;
    if out_value < DUST_THRESHOLD {
        return Err(SweepError::DustAfterFee);
    }

    let previous_output = OutPoint {
        txid: Txid::from_str(txid).map_err(|_| SweepError::MissingField("tx_id"))?,
        vout,
    };

    let mut witness = Witness::new();
    witness.push(preimage);
    witness.push(redeem_script.as_bytes());

    let input = TxIn {
        previous_output,
        script_sig: ScriptBuf::new(),
        sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
        witness,
    };

    let output = TxOut { value: Amount::from_sat(out_value), script_pubkey: donation_script_pubkey };

    Ok(Transaction {
        version: Version::TWO,
        lock_time: bitcoin::absolute::LockTime::ZERO,
        input: vec![input],
        output: vec![output],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin_utils::script::build_hash_lock_script;

    #[test]
    fn builds_single_input_single_output_transaction() {
        let preimage = [0x11u8; 32];
        let redeem_script = build_hash_lock_script(&preimage);
        let donation = ScriptBuf::from(vec![0x00, 0x14]);
        let tx = build_sweep_transaction(
            &"11".repeat(32),
            1,
            5000,
            &preimage,
            &redeem_script,
            donation,
            1,
        )
        .unwrap();
        assert_eq!(tx.input.len(), 1);
        assert_eq!(tx.output.len(), 1);
        assert_eq!(tx.input[0].witness.len(), 2);
        assert!(tx.output[0].value < Amount::from_sat(5000));
        assert_eq!(tx.version, Version::TWO);
    }

    #[test]
    fn dust_after_fee_is_rejected() {
        let preimage = [0x11u8; 32];
        let redeem_script = build_hash_lock_script(&preimage);
        let donation = ScriptBuf::from(vec![0x00, 0x14]);
        let result = build_sweep_transaction(&"22".repeat(32), 0, 200, &preimage, &redeem_script, donation, 1);
        assert!(matches!(result, Err(SweepError::DustAfterFee)));
    }
}
