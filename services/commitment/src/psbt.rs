//! PSBT-0 assembly. Uses the
//! `bitcoin` crate's own `Psbt` type rather than hand-rolling the
//! binary container, matching the ecosystem's standard representation
//! of "magic `70 73 62 74 ff`, global map, per-input maps, per-output
//! maps."

use std::str::FromStr;

use bitcoin::hashes::Hash as _;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction as BtcTransaction, TxIn, TxOut, Txid, Witness};
use starlight_types::AddressUtxo;

use crate::error::{CommitmentError, Result};

/// One selected input together with its previous output, fetched so
/// the builder can determine its script class and
/// attach both `non_witness_utxo` and `witness_utxo` to the PSBT
/// input map.
pub struct SelectedInput {
    pub utxo: AddressUtxo,
    pub prev_tx: starlight_types::Transaction,
    pub prev_output: starlight_types::TxOutput,
}

pub fn selected_outpoint(input: &SelectedInput) -> Result<OutPoint> {
    let txid = Txid::from_str(&input.utxo.txid)
        .map_err(|e| CommitmentError::Psbt(format!("invalid txid {}: {e}", input.utxo.txid)))?;
    Ok(OutPoint { txid, vout: input.utxo.vout })
}

/// Whether every selected input resolves to a SegWit prevout
/// (P2WPKH/P2WSH/Taproot): the precondition for precomputing
/// `funding_txid`.
pub fn all_segwit(inputs: &[SelectedInput]) -> bool {
    inputs.iter().all(|input| {
        let spk = ScriptBuf::from(input.prev_output.script_pubkey.clone());
        let is_p2tr = spk.as_bytes().len() == 34 && spk.as_bytes()[0] == 0x51 && spk.as_bytes()[1] == 0x20;
        is_p2tr
            || matches!(
                bitcoin_utils::address::extract_standard_script_hash(&spk),
                Some(bitcoin_utils::address::StandardScriptHash::P2wpkh(_))
                    | Some(bitcoin_utils::address::StandardScriptHash::P2wsh(_))
            )
    })
}

/// Builds the unsigned transaction and wraps it as a PSBT, attaching
/// `witness_utxo`/`non_witness_utxo` per input. Output maps stay empty.
pub fn build_psbt(inputs: &[SelectedInput], outputs: Vec<TxOut>, locktime: u32) -> Result<bitcoin::psbt::Psbt> {
    let mut tx_inputs = Vec::with_capacity(inputs.len());
    for input in inputs {
        tx_inputs.push(TxIn {
            previous_output: selected_outpoint(input)?,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::new(),
        });
    }

    let unsigned_tx = BtcTransaction {
        version: Version::TWO,
        lock_time: bitcoin::absolute::LockTime::from_consensus(locktime),
        input: tx_inputs,
        output: outputs,
    };

    let mut psbt = bitcoin::psbt::Psbt::from_unsigned_tx(unsigned_tx)
        .map_err(|e| CommitmentError::Psbt(e.to_string()))?;

    for (i, input) in inputs.iter().enumerate() {
        let prev_spk = ScriptBuf::from(input.prev_output.script_pubkey.clone());
        psbt.inputs[i].witness_utxo = Some(TxOut { value: Amount::from_sat(input.prev_output.value), script_pubkey: prev_spk });
        psbt.inputs[i].non_witness_utxo = Some(transaction_to_bitcoin_tx(&input.prev_tx));
    }

    Ok(psbt)
}

/// Canonical txid of the unsigned tx, computed the same way
/// `block-parser` recomputes txids from the wire: `version ||
/// vin || vout || locktime`, no witness data. Valid as the *final*
/// txid only when every input is SegWit — otherwise
/// the real scriptSig inserted at signing time would change it.
pub fn precomputed_txid(inputs: &[SelectedInput], outputs: &[TxOut], locktime: u32) -> Result<[u8; 32]> {
    let tx_inputs: Vec<starlight_types::TxInput> = inputs
        .iter()
        .map(|input| {
            let mut prev_txid = [0u8; 32];
            let parsed = hex::decode(&input.utxo.txid).unwrap_or_default();
            let mut rev = parsed;
            rev.reverse();
            let len = rev.len().min(32);
            prev_txid[..len].copy_from_slice(&rev[..len]);
            starlight_types::TxInput {
                prev_txid,
                prev_index: input.utxo.vout,
                script_sig: Vec::new(),
                sequence: 0xFFFF_FFFF,
            }
        })
        .collect();

    let tx_outputs: Vec<starlight_types::TxOutput> = outputs
        .iter()
        .map(|o| starlight_types::TxOutput { value: o.value.to_sat(), script_pubkey: o.script_pubkey.clone().into_bytes() })
        .collect();

    let legacy = block_parser::serialize_legacy(2, &tx_inputs, &tx_outputs, locktime);
    Ok(starlight_types::sha256d(&legacy))
}

fn transaction_to_bitcoin_tx(tx: &starlight_types::Transaction) -> BtcTransaction {
    BtcTransaction {
        version: Version(tx.version),
        lock_time: bitcoin::absolute::LockTime::from_consensus(tx.locktime),
        input: tx
            .inputs
            .iter()
            .map(|i| TxIn {
                previous_output: OutPoint {
                    txid: Txid::from_str(&starlight_types::reversed_hex(&i.prev_txid))
                        .unwrap_or_else(|_| Txid::from_raw_hash(bitcoin::hashes::Hash::all_zeros())),
                    vout: i.prev_index,
                },
                script_sig: ScriptBuf::from(i.script_sig.clone()),
                sequence: Sequence(i.sequence),
                witness: Witness::new(),
            })
            .collect(),
        output: tx
            .outputs
            .iter()
            .map(|o| TxOut { value: Amount::from_sat(o.value), script_pubkey: ScriptBuf::from(o.script_pubkey.clone()) })
            .collect(),
    }
}
