//! Per-contract task proof updates and sweep invocation, the tail end
//! of oracle reconciliation.

use chain_client::ChainClient;
use starlight_types::{BitcoinNetwork, ConfirmationStatus, Task, Transaction};
use sweep::{SweepOutcome, SweepStore, TaskFilter};

use crate::error::Result;

/// Picks the output that pays `task.contractor_wallet`, preferring one
/// whose value equals the task budget, else the first unmatched
/// candidate.
fn find_funding_output<'a>(tx: &'a Transaction, contractor_wallet_spk: &[u8], budget_sats: u64) -> Option<(usize, &'a starlight_types::TxOutput)> {
    let candidates: Vec<_> = tx.outputs.iter().enumerate().filter(|(_, o)| o.script_pubkey == contractor_wallet_spk).collect();
    candidates
        .iter()
        .find(|(_, o)| o.value == budget_sats)
        .or_else(|| candidates.first())
        .map(|(i, o)| (*i, *o))
}

/// For every task under `contract_id`, if this transaction pays its
/// contractor wallet, records a funding proof; then invokes the sweep
/// engine for every task whose proof txid equals this transaction.
#[allow(clippy::too_many_arguments)]
pub async fn update_task_proofs_and_sweep(
    sweep_store: &dyn SweepStore,
    chain_client: &dyn ChainClient,
    network: BitcoinNetwork,
    donation_address: &str,
    fee_rate: u64,
    contract_id: &str,
    tx: &Transaction,
    block_height: u64,
    now: u64,
) -> Result<()> {
    let tx_id = tx.txid_hex();
    let tasks: Vec<Task> = sweep_store
        .list_tasks(TaskFilter { confirmed_not_swept: false, contract_id: Some(contract_id.to_string()) })
        .await
        .map_err(|e| crate::error::ReconcileError::IngestionStore(e.to_string()))?;

    for task in tasks {
        let Ok(contractor_spk) = bitcoin_utils::address::script_pubkey_for_address(&task.contractor_wallet, network) else { continue };

        let mut proof = task.proof.clone();

        if let Some((_, output)) = find_funding_output(tx, contractor_spk.as_bytes(), task.budget_sats) {
            let mut updated = proof.clone().unwrap_or_else(|| starlight_types::TaskProof {
                tx_id: String::new(),
                block_height: 0,
                funding_address: task.contractor_wallet.clone(),
                funded_amount_sats: 0,
                contractor_wallet: task.contractor_wallet.clone(),
                commitment_redeem_script: String::new(),
                commitment_vout: 0,
                commitment_pixel_hash: String::new(),
                confirmation_status: ConfirmationStatus::Provisional,
                confirmed_at: None,
                sweep_tx_id: None,
                sweep_status: starlight_types::SweepStatus::None,
                sweep_attempted_at: None,
                sweep_error: None,
            });

            if !updated.tx_id.is_empty() && updated.tx_id != tx_id {
                tracing::info!(task_id = %task.task_id, old_txid = %updated.tx_id, new_txid = %tx_id, "reorg: funding proof txid changed");
            }

            updated.tx_id = tx_id.clone();
            updated.block_height = block_height;
            updated.funded_amount_sats = find_funding_output(tx, contractor_spk.as_bytes(), task.budget_sats).map(|(_, o)| o.value).unwrap_or(0);
            updated.confirmation_status = ConfirmationStatus::Confirmed;
            updated.confirmed_at = Some(now);

            sweep_store
                .update_task_proof(&task.task_id, updated.clone())
                .await
                .map_err(|e| crate::error::ReconcileError::IngestionStore(e.to_string()))?;
            proof = Some(updated);
        }

        if let Some(mut proof) = proof {
            if proof.tx_id == tx_id {
                let outcome = sweep::sweep_commitment_if_ready(
                    chain_client,
                    network,
                    donation_address,
                    fee_rate,
                    &mut proof,
                    now,
                    sweep::DEFAULT_RETRY_COOLDOWN,
                )
                .await;
                if !matches!(outcome, SweepOutcome::NotDue) {
                    sweep_store
                        .update_task_proof(&task.task_id, proof)
                        .await
                        .map_err(|e| crate::error::ReconcileError::IngestionStore(e.to_string()))?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_client::MockChainClient;
    use starlight_types::{SweepStatus, TxOutput};
    use sweep::MockSweepStore;

    const TESTNET_ADDR: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    fn tx_paying(spk: &[u8], value: u64, txid_hex: &str) -> Transaction {
        let mut txid = [0u8; 32];
        let mut bytes = hex::decode(txid_hex).unwrap();
        bytes.reverse();
        txid[..bytes.len()].copy_from_slice(&bytes);
        Transaction {
            version: 2,
            inputs: vec![],
            outputs: vec![TxOutput { value, script_pubkey: spk.to_vec() }],
            locktime: 0,
            has_witness: false,
            witnesses: vec![],
            txid,
        }
    }

    #[tokio::test]
    async fn first_funding_tx_records_a_proof_and_does_not_sweep() {
        let spk = bitcoin_utils::address::script_pubkey_for_address(TESTNET_ADDR, BitcoinNetwork::Testnet4).unwrap();
        let txid_hex = "cd".repeat(32);
        let tx = tx_paying(spk.as_bytes(), 5000, &txid_hex);

        let task = Task {
            task_id: "task-1".into(),
            contract_id: "contract-1".into(),
            contractor_wallet: TESTNET_ADDR.to_string(),
            budget_sats: 5000,
            proof: None,
        };

        let mut sweep_store = MockSweepStore::new();
        sweep_store.expect_list_tasks().returning(move |_| Ok(vec![task.clone()]));
        sweep_store
            .expect_update_task_proof()
            .withf(|task_id, proof| task_id == "task-1" && proof.funded_amount_sats == 5000 && proof.confirmation_status == ConfirmationStatus::Confirmed)
            .returning(|_, _| Ok(()));

        let chain_client = MockChainClient::new();

        update_task_proofs_and_sweep(&sweep_store, &chain_client, BitcoinNetwork::Testnet4, "", 1, "contract-1", &tx, 100, 1_700_000_000)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn matching_proof_txid_invokes_sweep_and_persists_outcome() {
        let spk = bitcoin_utils::address::script_pubkey_for_address(TESTNET_ADDR, BitcoinNetwork::Testnet4).unwrap();
        let txid_hex = "ef".repeat(32);
        let tx = tx_paying(spk.as_bytes(), 5000, &txid_hex);

        let existing_proof = starlight_types::TaskProof {
            tx_id: txid_hex.clone(),
            block_height: 100,
            funding_address: TESTNET_ADDR.to_string(),
            funded_amount_sats: 5000,
            contractor_wallet: TESTNET_ADDR.to_string(),
            commitment_redeem_script: String::new(),
            commitment_vout: 0,
            commitment_pixel_hash: String::new(),
            confirmation_status: ConfirmationStatus::Confirmed,
            confirmed_at: Some(1_699_000_000),
            sweep_tx_id: None,
            sweep_status: SweepStatus::None,
            sweep_attempted_at: None,
            sweep_error: None,
        };
        let task = Task {
            task_id: "task-2".into(),
            contract_id: "contract-2".into(),
            contractor_wallet: TESTNET_ADDR.to_string(),
            budget_sats: 5000,
            proof: Some(existing_proof),
        };

        let persisted = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let persisted_clone = persisted.clone();

        let mut sweep_store = MockSweepStore::new();
        sweep_store.expect_list_tasks().returning(move |_| Ok(vec![task.clone()]));
        sweep_store.expect_update_task_proof().returning(move |_, proof| {
            persisted_clone.lock().unwrap().push(proof);
            Ok(())
        });

        let chain_client = MockChainClient::new();

        update_task_proofs_and_sweep(&sweep_store, &chain_client, BitcoinNetwork::Testnet4, "tb1qdonationaddressexample0000000", 1, "contract-2", &tx, 100, 1_700_000_000)
            .await
            .unwrap();

        // the sweep attempt ran and its outcome (skipped: no redeem
        // script on this proof) was persisted as the final state.
        let calls = persisted.lock().unwrap();
        assert_eq!(calls.last().unwrap().sweep_status, SweepStatus::Skipped);
    }
}
