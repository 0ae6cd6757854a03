use serde::{Deserialize, Serialize};

/// A confirmed (or unconfirmed) UTXO as reported by the chain client's
/// address-lookup endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressUtxo {
    pub txid: String,
    pub vout: u32,
    pub value_sats: u64,
    pub confirmed: bool,
}
