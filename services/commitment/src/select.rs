//! Greedy UTXO selection shared by the single- and multi-payer PSBT
//! builders.

use starlight_types::AddressUtxo;

use crate::fee::estimate_fee;
use bitcoin_utils::vbyte::P2WSH_INPUT_VBYTES;

/// Greedily selects UTXOs (in listing order, smallest-first if the
/// caller sorts them that way) until `selected >= target +
/// estimated_fee(selected_so_far)`. The per-iteration fee estimate
/// uses a conservative flat per-input vbyte cost since the selection
/// loop has not yet fetched previous outputs to learn real script
/// classes.
pub fn greedy_select(utxos: &[AddressUtxo], target: u64, fee_rate: u64) -> Option<Vec<AddressUtxo>> {
    let mut selected = Vec::new();
    let mut total = 0u64;

    for utxo in utxos {
        if total >= target {
            let fee = estimate_fee(fee_rate, selected.len() as u64 * P2WSH_INPUT_VBYTES, 1);
            if total >= target + fee {
                break;
            }
        }
        selected.push(utxo.clone());
        total += utxo.value_sats;
    }

    let fee = estimate_fee(fee_rate, selected.len() as u64 * P2WSH_INPUT_VBYTES, 1);
    if total >= target + fee {
        Some(selected)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utxo(value: u64) -> AddressUtxo {
        AddressUtxo { txid: "a".repeat(64), vout: 0, value_sats: value, confirmed: true }
    }

    #[test]
    fn selects_just_enough_utxos() {
        let utxos = vec![utxo(1000), utxo(2000), utxo(5000)];
        let selected = greedy_select(&utxos, 2500, 1).unwrap();
        assert!(selected.iter().map(|u| u.value_sats).sum::<u64>() >= 2500);
        assert!(selected.len() <= 2);
    }

    #[test]
    fn none_when_insufficient() {
        let utxos = vec![utxo(100)];
        assert!(greedy_select(&utxos, 1_000_000, 1).is_none());
    }
}
