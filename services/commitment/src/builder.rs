//! Funding PSBT assembly.

use bitcoin::{Amount, TxOut};
use chain_client::ChainClient;
use starlight_types::{AddressUtxo, BitcoinNetwork};

use crate::error::{CommitmentError, Result};
use crate::fee::{estimate_fee, DUST_THRESHOLD};
use crate::lock::{build_hash_lock_script, p2wsh_script_pubkey};
use crate::psbt::{all_segwit, build_psbt, precomputed_txid, SelectedInput};
use crate::select::greedy_select;

const MAX_MULTI_PAYER_PASSES: u32 = 5;

#[derive(Debug, Clone)]
pub struct PayoutTarget {
    pub address: String,
    pub sats: u64,
}

#[derive(Debug, Clone)]
pub struct CommitmentRequest {
    pub pixel_hash: [u8; 32],
    pub commitment_sats: Option<u64>,
}

impl CommitmentRequest {
    fn floored_sats(&self) -> u64 {
        self.commitment_sats.unwrap_or(DUST_THRESHOLD).max(DUST_THRESHOLD)
    }
}

#[derive(Debug, Clone)]
pub struct FundingResult {
    pub psbt_hex: String,
    /// Empty when any selected input resolves to a non-SegWit prevout.
    pub funding_txid: String,
    pub fee: u64,
    pub change: Option<u64>,
    pub selected_input_count: usize,
}

async fn fetch_selected_inputs(
    chain_client: &dyn ChainClient,
    utxos: &[AddressUtxo],
) -> Result<Vec<SelectedInput>> {
    let mut inputs = Vec::with_capacity(utxos.len());
    for utxo in utxos {
        let (prev_tx, prev_output) = chain_client.tx_output(&utxo.txid, utxo.vout).await?;
        inputs.push(SelectedInput { utxo: utxo.clone(), prev_tx, prev_output });
    }
    Ok(inputs)
}

fn total_input_vbytes(inputs: &[SelectedInput]) -> u64 {
    inputs
        .iter()
        .map(|i| {
            let spk = bitcoin::ScriptBuf::from(i.prev_output.script_pubkey.clone());
            bitcoin_utils::vbyte::input_vbytes_for_script_pubkey(&spk)
        })
        .sum()
}

fn commitment_output(request: &CommitmentRequest) -> TxOut {
    let redeem = build_hash_lock_script(&request.pixel_hash);
    TxOut { value: Amount::from_sat(request.floored_sats()), script_pubkey: p2wsh_script_pubkey(&redeem) }
}

fn payout_outputs(network: BitcoinNetwork, payouts: &[PayoutTarget]) -> Result<Vec<TxOut>> {
    payouts
        .iter()
        .map(|p| {
            let spk = bitcoin_utils::address::script_pubkey_for_address(&p.address, network)?;
            Ok(TxOut { value: Amount::from_sat(p.sats), script_pubkey: spk })
        })
        .collect()
}

fn format_txid(bytes: [u8; 32]) -> String {
    starlight_types::reversed_hex(&bytes)
}

/// Single-payer funding PSBT: one or more payer addresses,
/// one wallet.
pub async fn build_single_payer_psbt(
    chain_client: &dyn ChainClient,
    network: BitcoinNetwork,
    payer_addresses: &[String],
    payouts: &[PayoutTarget],
    commitment: Option<CommitmentRequest>,
    fee_rate: u64,
) -> Result<FundingResult> {
    let mut utxos = Vec::new();
    for address in payer_addresses {
        utxos.extend(chain_client.list_confirmed_utxos(address).await?);
    }
    if utxos.is_empty() {
        return Err(CommitmentError::NoUtxos);
    }

    let payout_total: u64 = payouts.iter().map(|p| p.sats).sum();
    let commitment_sats = commitment.as_ref().map(|c| c.floored_sats()).unwrap_or(0);
    let required = payout_total + commitment_sats;

    let selected_utxos = greedy_select(&utxos, required, fee_rate).ok_or(CommitmentError::InsufficientFunds)?;
    let inputs = fetch_selected_inputs(chain_client, &selected_utxos).await?;
    let input_vbytes = total_input_vbytes(&inputs);

    let mut outputs = payout_outputs(network, payouts)?;
    if let Some(ref request) = commitment {
        outputs.push(commitment_output(request));
    }
    let base_output_count = outputs.len() as u64;

    let selected_total: u64 = selected_utxos.iter().map(|u| u.value_sats).sum();
    let available = selected_total.checked_sub(required).ok_or(CommitmentError::InsufficientFunds)?;

    let fee_with_change = estimate_fee(fee_rate, input_vbytes, base_output_count + 1);
    let (fee, change) = if available >= fee_with_change && available - fee_with_change >= DUST_THRESHOLD {
        (fee_with_change, Some(available - fee_with_change))
    } else {
        let fee_without_change = estimate_fee(fee_rate, input_vbytes, base_output_count);
        if available < fee_without_change {
            return Err(CommitmentError::InsufficientFunds);
        }
        (available, None)
    };

    if let Some(change_sats) = change {
        outputs.push(TxOut {
            value: Amount::from_sat(change_sats),
            script_pubkey: bitcoin_utils::address::script_pubkey_for_address(&payer_addresses[0], network)?,
        });
    }

    let funding_txid = if all_segwit(&inputs) {
        format_txid(precomputed_txid(&inputs, &outputs, 0)?)
    } else {
        String::new()
    };

    let psbt = build_psbt(&inputs, outputs, 0)?;
    let psbt_hex = hex::encode(psbt.serialize());

    Ok(FundingResult {
        psbt_hex,
        funding_txid,
        fee,
        change,
        selected_input_count: inputs.len(),
    })
}

#[derive(Debug, Clone)]
pub struct PayerTarget {
    pub address: String,
    pub target_sats: u64,
}

#[derive(Debug, Clone)]
pub struct MultiPayerResult {
    pub psbt_hex: String,
    pub funding_txid: String,
    pub fee: u64,
    /// Parallel to the input `payers` slice.
    pub per_payer_fee_share: Vec<u64>,
    /// Parallel to the input `payers` slice; `None` where that
    /// payer's change was dust and absorbed into the fee.
    pub per_payer_change: Vec<Option<u64>>,
}

struct PayerSelection {
    address: String,
    target: u64,
    available: Vec<AddressUtxo>,
    selected: Vec<AddressUtxo>,
}

impl PayerSelection {
    fn selected_total(&self) -> u64 {
        self.selected.iter().map(|u| u.value_sats).sum()
    }

    /// Adds the next-smallest unselected UTXO, if any remain.
    fn add_one(&mut self) -> bool {
        if self.available.is_empty() {
            return false;
        }
        self.selected.push(self.available.remove(0));
        true
    }
}

/// Multi-payer ("raise-fund") funding PSBT: each payer
/// contributes their target plus a pro-rata share of the total fee,
/// refined over a bounded number of passes.
pub async fn build_multi_payer_psbt(
    chain_client: &dyn ChainClient,
    network: BitcoinNetwork,
    payers: &[PayerTarget],
    payouts: &[PayoutTarget],
    commitment: Option<CommitmentRequest>,
    fee_rate: u64,
) -> Result<MultiPayerResult> {
    if payers.is_empty() {
        return Err(CommitmentError::NoUtxos);
    }

    let mut selections = Vec::with_capacity(payers.len());
    for payer in payers {
        let mut available = chain_client.list_confirmed_utxos(&payer.address).await?;
        available.sort_by_key(|u| u.value_sats);
        let mut selection = PayerSelection { address: payer.address.clone(), target: payer.target_sats, available, selected: Vec::new() };
        while selection.selected_total() < selection.target {
            if !selection.add_one() {
                return Err(CommitmentError::InsufficientFunds);
            }
        }
        selections.push(selection);
    }

    let base_output_count = payouts.len() as u64 + commitment.is_some() as u64;

    let mut fee_shares = vec![0u64; selections.len()];
    for _pass in 0..MAX_MULTI_PAYER_PASSES {
        let total_inputs: u64 = selections.iter().map(|s| s.selected.len() as u64).sum();
        let output_count = base_output_count + selections.len() as u64;
        let estimated_vbytes = total_inputs * bitcoin_utils::vbyte::P2WSH_INPUT_VBYTES;
        let fee = estimate_fee(fee_rate, estimated_vbytes, output_count);
        let total_selected: u64 = selections.iter().map(|s| s.selected_total()).sum();

        fee_shares = allocate_pro_rata(fee, &selections.iter().map(|s| s.selected_total()).collect::<Vec<_>>(), total_selected);

        let mut needs_another_pass = false;
        for (selection, share) in selections.iter_mut().zip(fee_shares.iter()) {
            if selection.selected_total() < selection.target + share {
                if selection.add_one() {
                    needs_another_pass = true;
                } else {
                    return Err(CommitmentError::InsufficientFunds);
                }
            }
        }
        if !needs_another_pass {
            break;
        }
    }

    let mut all_utxos = Vec::new();
    for selection in &selections {
        all_utxos.extend(selection.selected.clone());
    }
    let inputs = fetch_selected_inputs(chain_client, &all_utxos).await?;
    let input_vbytes = total_input_vbytes(&inputs);
    let contributions: Vec<u64> = selections.iter().map(|s| s.selected_total()).collect();
    let total_selected: u64 = contributions.iter().sum();

    // Recompute fee and per-payer shares each time a payer's change
    // drops below dust and is absorbed into the fee, since that
    // shrinks the output count the fee is based on. Bounded: each
    // pass can only remove change outputs, never add them back, so
    // this converges in at most `selections.len()` passes.
    let mut change_output_count = selections.len() as u64;
    let mut fee = estimate_fee(fee_rate, input_vbytes, base_output_count + change_output_count);
    let mut fee_shares = allocate_pro_rata(fee, &contributions, total_selected);
    let mut per_payer_change: Vec<Option<u64>> = vec![None; selections.len()];

    for _pass in 0..MAX_MULTI_PAYER_PASSES {
        per_payer_change = selections
            .iter()
            .zip(fee_shares.iter())
            .map(|(selection, share)| {
                let change = selection.selected_total().saturating_sub(selection.target + share);
                if change >= DUST_THRESHOLD {
                    Some(change)
                } else {
                    None
                }
            })
            .collect();

        let new_change_output_count = per_payer_change.iter().filter(|c| c.is_some()).count() as u64;
        if new_change_output_count == change_output_count {
            break;
        }
        change_output_count = new_change_output_count;
        fee = estimate_fee(fee_rate, input_vbytes, base_output_count + change_output_count);
        fee_shares = allocate_pro_rata(fee, &contributions, total_selected);
    }

    let mut outputs = payout_outputs(network, payouts)?;
    if let Some(ref request) = commitment {
        outputs.push(commitment_output(request));
    }
    for (selection, change) in selections.iter().zip(per_payer_change.iter()) {
        if let Some(change_sats) = change {
            outputs.push(TxOut {
                value: Amount::from_sat(*change_sats),
                script_pubkey: bitcoin_utils::address::script_pubkey_for_address(&selection.address, network)?,
            });
        }
    }

    let funding_txid = if all_segwit(&inputs) {
        format_txid(precomputed_txid(&inputs, &outputs, 0)?)
    } else {
        String::new()
    };

    let psbt = build_psbt(&inputs, outputs, 0)?;
    let psbt_hex = hex::encode(psbt.serialize());

    Ok(MultiPayerResult {
        psbt_hex,
        funding_txid,
        fee,
        per_payer_fee_share: fee_shares,
        per_payer_change,
    })
}

/// Allocates `total_fee` across payers proportionally to their
/// contributed value, with all rounding remainder going to the last
/// payer.
fn allocate_pro_rata(total_fee: u64, contributions: &[u64], total_contributed: u64) -> Vec<u64> {
    if contributions.is_empty() || total_contributed == 0 {
        return vec![0; contributions.len()];
    }
    let mut shares: Vec<u64> = contributions
        .iter()
        .map(|&c| (total_fee as u128 * c as u128 / total_contributed as u128) as u64)
        .collect();
    let allocated: u64 = shares.iter().sum();
    if let Some(last) = shares.last_mut() {
        *last += total_fee.saturating_sub(allocated);
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_client::MockChainClient;
    use starlight_types::TxOutput;
    use std::sync::Mutex;

    #[test]
    fn pro_rata_allocation_sums_exactly_to_total_fee() {
        let shares = allocate_pro_rata(100, &[300, 700], 1000);
        assert_eq!(shares.iter().sum::<u64>(), 100);
    }

    #[test]
    fn pro_rata_allocation_handles_zero_total() {
        let shares = allocate_pro_rata(100, &[0, 0], 0);
        assert_eq!(shares, vec![0, 0]);
    }

    const PAYER_ADDR: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    fn dummy_prev_tx() -> starlight_types::Transaction {
        starlight_types::Transaction {
            version: 2,
            inputs: vec![],
            outputs: vec![],
            locktime: 0,
            has_witness: false,
            witnesses: vec![],
            txid: [0u8; 32],
        }
    }

    /// One payer's margin over target+share is always under the dust
    /// threshold, so its change output is dropped. The fix must then
    /// recompute the fee and the other payer's share using the
    /// reduced (one fewer) output count rather than the stale
    /// all-payers-get-change estimate.
    #[tokio::test]
    async fn dust_change_is_dropped_and_fee_recomputed_for_remaining_payer() {
        let spk = bitcoin_utils::address::script_pubkey_for_address(PAYER_ADDR, BitcoinNetwork::Testnet4).unwrap();
        let spk_bytes = spk.as_bytes().to_vec();

        let txid_a = "aa".repeat(32);
        let txid_b = "bb".repeat(32);
        let utxo_a = AddressUtxo { txid: txid_a.clone(), vout: 0, value_sats: 3050, confirmed: true };
        let utxo_b = AddressUtxo { txid: txid_b.clone(), vout: 0, value_sats: 70_000, confirmed: true };

        let call_count = Mutex::new(0usize);
        let (ua, ub) = (utxo_a.clone(), utxo_b.clone());
        let mut chain_client = MockChainClient::new();
        chain_client.expect_list_confirmed_utxos().returning(move |_| {
            let mut n = call_count.lock().unwrap();
            let result = if *n == 0 { vec![ua.clone()] } else { vec![ub.clone()] };
            *n += 1;
            Ok(result)
        });
        let spk_for_tx_output = spk_bytes.clone();
        chain_client.expect_tx_output().returning(move |txid, _vout| {
            let value = if txid == txid_a.as_str() { 3050 } else { 70_000 };
            Ok((dummy_prev_tx(), TxOutput { value, script_pubkey: spk_for_tx_output.clone() }))
        });

        let payers = vec![
            PayerTarget { address: PAYER_ADDR.to_string(), target_sats: 3000 },
            PayerTarget { address: PAYER_ADDR.to_string(), target_sats: 50_000 },
        ];
        let payouts = vec![PayoutTarget { address: PAYER_ADDR.to_string(), sats: 1000 }];

        let result = build_multi_payer_psbt(&chain_client, BitcoinNetwork::Testnet4, &payers, &payouts, None, 1)
            .await
            .unwrap();

        assert_eq!(result.per_payer_change, vec![None, Some(19_790)]);
        assert_eq!(result.per_payer_fee_share, vec![9, 210]);
        assert_eq!(result.fee, 219);
    }
}
