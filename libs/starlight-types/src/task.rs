use serde::{Deserialize, Serialize};

/// Confirmation status of a task's on-chain funding proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Provisional,
    Confirmed,
}

/// Sweep status of a task's commitment output. `Confirmed` is
/// terminal: once set it cannot transition to any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepStatus {
    /// No sweep has been attempted yet (empty string in the wire
    /// representation).
    None,
    Broadcast,
    Confirmed,
    Skipped,
    Failed,
}

impl SweepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SweepStatus::Confirmed)
    }

    pub fn is_retryable(self, cooldown_elapsed: bool) -> bool {
        match self {
            SweepStatus::Confirmed => false,
            SweepStatus::Broadcast => cooldown_elapsed,
            SweepStatus::Skipped | SweepStatus::Failed | SweepStatus::None => true,
        }
    }
}

/// A task's current funding/commitment proof. Exclusively mutated
/// by the reconciliation and sweep engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProof {
    pub tx_id: String,
    pub block_height: u64,
    pub funding_address: String,
    pub funded_amount_sats: u64,
    pub contractor_wallet: String,
    /// Hex-encoded hash-lock redeem script.
    pub commitment_redeem_script: String,
    pub commitment_vout: u32,
    /// Hex of the preimage (the visible-pixel hash / commitment pixel
    /// hash), interpreted as raw bytes by the sweep engine.
    pub commitment_pixel_hash: String,
    pub confirmation_status: ConfirmationStatus,
    pub confirmed_at: Option<u64>,
    pub sweep_tx_id: Option<String>,
    pub sweep_status: SweepStatus,
    pub sweep_attempted_at: Option<u64>,
    pub sweep_error: Option<String>,
}

impl TaskProof {
    /// Invariant: `confirmed` implies `tx_id`/`block_height` are set.
    pub fn is_confirmed(&self) -> bool {
        self.confirmation_status == ConfirmationStatus::Confirmed
            && !self.tx_id.is_empty()
            && self.block_height > 0
    }
}

/// An externally-owned task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub contract_id: String,
    pub contractor_wallet: String,
    pub budget_sats: u64,
    pub proof: Option<TaskProof>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmed_sweep_status_is_never_retryable() {
        assert!(!SweepStatus::Confirmed.is_retryable(true));
        assert!(!SweepStatus::Confirmed.is_retryable(false));
        assert!(SweepStatus::Confirmed.is_terminal());
    }

    #[test]
    fn broadcast_is_retryable_only_after_cooldown() {
        assert!(!SweepStatus::Broadcast.is_retryable(false));
        assert!(SweepStatus::Broadcast.is_retryable(true));
    }

    #[test]
    fn failed_and_skipped_are_always_retryable() {
        assert!(SweepStatus::Failed.is_retryable(false));
        assert!(SweepStatus::Skipped.is_retryable(false));
    }
}
