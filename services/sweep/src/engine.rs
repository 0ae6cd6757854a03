//! Commitment sweep engine.

use std::time::Duration;

use bitcoin::ScriptBuf;
use chain_client::{ChainClient, ChainClientError};
use starlight_types::{BitcoinNetwork, SweepStatus, TaskProof};

use crate::build::build_sweep_transaction;
use crate::error::SweepError;

/// Default retry cooldown for a `broadcast` proof.
pub const DEFAULT_RETRY_COOLDOWN: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Not attempted: still within the broadcast cooldown, or the
    /// proof is already terminal (`sweep_status=confirmed`).
    NotDue,
    Broadcast { tx_id: String },
    Skipped { reason: String },
    Failed { error: String },
}

fn cooldown_elapsed(proof: &TaskProof, now: u64, cooldown: Duration) -> bool {
    match proof.sweep_attempted_at {
        None => true,
        Some(attempted_at) => now.saturating_sub(attempted_at) >= cooldown.as_secs(),
    }
}

/// Attempts to sweep a task's hash-lock commitment if it is
/// confirmed and not yet swept. Mutates `proof` in place to reflect
/// the outcome; callers persist it via the proof store.
pub async fn sweep_commitment_if_ready(
    chain_client: &dyn ChainClient,
    network: BitcoinNetwork,
    donation_address: &str,
    fee_rate: u64,
    proof: &mut TaskProof,
    now: u64,
    cooldown: Duration,
) -> SweepOutcome {
    if proof.sweep_status.is_terminal() {
        return SweepOutcome::NotDue;
    }
    if proof.sweep_status == SweepStatus::Broadcast && !cooldown_elapsed(proof, now, cooldown) {
        return SweepOutcome::NotDue;
    }
    if !proof.is_confirmed() {
        return SweepOutcome::NotDue;
    }

    if donation_address.is_empty() {
        return mark_skipped(proof, now, "missing donation destination address");
    }
    if proof.commitment_redeem_script.is_empty() {
        return mark_skipped(proof, now, "missing commitment redeem script");
    }
    if proof.tx_id.is_empty() {
        return mark_skipped(proof, now, "missing tx id");
    }
    if proof.commitment_pixel_hash.is_empty() {
        return mark_skipped(proof, now, "missing preimage");
    }

    let redeem_bytes = match hex::decode(&proof.commitment_redeem_script) {
        Ok(b) => b,
        Err(_) => return mark_skipped(proof, now, "redeem script is not valid hex"),
    };
    let redeem_script = ScriptBuf::from(redeem_bytes);
    if bitcoin_utils::script::parse_hash_lock_script(&redeem_script).is_none() {
        return mark_skipped(proof, now, "redeem script is not hash-lock-only");
    }

    let preimage_bytes = match hex::decode(&proof.commitment_pixel_hash) {
        Ok(b) if b.len() == 32 => b,
        _ => return mark_skipped(proof, now, "preimage is not valid 32-byte hex"),
    };
    let mut preimage = [0u8; 32];
    preimage.copy_from_slice(&preimage_bytes);

    let (_prev_tx, prev_output) = match chain_client.tx_output(&proof.tx_id, proof.commitment_vout).await {
        Ok(v) => v,
        Err(ChainClientError::Permanent { status: 404, .. }) => {
            return mark_skipped(proof, now, "fetch retry");
        }
        Err(ChainClientError::OutputIndexOutOfRange { .. }) => {
            return mark_skipped(proof, now, "commitment vout out of range");
        }
        Err(e) => return mark_failed(proof, now, &e.to_string()),
    };

    let donation_spk = match bitcoin_utils::address::script_pubkey_for_address(donation_address, network) {
        Ok(spk) => spk,
        Err(_) => return mark_skipped(proof, now, "invalid donation destination address"),
    };

    let tx = match build_sweep_transaction(
        &proof.tx_id,
        proof.commitment_vout,
        prev_output.value,
        &preimage,
        &redeem_script,
        donation_spk,
        fee_rate,
    ) {
        Ok(tx) => tx,
        Err(SweepError::DustAfterFee) => {
            return mark_skipped(proof, now, "output below dust after fee");
        }
        Err(e) => return mark_failed(proof, now, &e.to_string()),
    };

    let raw_hex = hex::encode(bitcoin::consensus::encode::serialize(&tx));

    match chain_client.broadcast(&raw_hex).await {
        Ok(broadcast_txid) => {
            proof.sweep_status = SweepStatus::Broadcast;
            proof.sweep_tx_id = Some(broadcast_txid.clone());
            proof.sweep_attempted_at = Some(now);
            proof.sweep_error = None;
            SweepOutcome::Broadcast { tx_id: broadcast_txid }
        }
        Err(e) => mark_failed(proof, now, &e.to_string()),
    }
}

fn mark_skipped(proof: &mut TaskProof, now: u64, reason: &str) -> SweepOutcome {
    proof.sweep_status = SweepStatus::Skipped;
    proof.sweep_attempted_at = Some(now);
    proof.sweep_error = Some(reason.to_string());
    SweepOutcome::Skipped { reason: reason.to_string() }
}

fn mark_failed(proof: &mut TaskProof, now: u64, error: &str) -> SweepOutcome {
    proof.sweep_status = SweepStatus::Failed;
    proof.sweep_attempted_at = Some(now);
    proof.sweep_error = Some(error.to_string());
    SweepOutcome::Failed { error: error.to_string() }
}
