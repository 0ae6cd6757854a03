//! Commitment script and PSBT builder: the hash-lock
//! redeem script, UTXO selection, and single-/multi-payer funding PSBT
//! assembly.

pub mod builder;
pub mod error;
pub mod fee;
pub mod lock;
pub mod psbt;
pub mod select;

pub use builder::{
    build_multi_payer_psbt, build_single_payer_psbt, CommitmentRequest, FundingResult, MultiPayerResult,
    PayerTarget, PayoutTarget,
};
pub use error::{CommitmentError, Result};
pub use fee::{estimate_fee, DUST_THRESHOLD};
pub use lock::{build_hash_lock_script, p2wsh_address, p2wsh_script_pubkey, parse_hash_lock_script};
pub use psbt::{all_segwit, build_psbt, precomputed_txid, selected_outpoint, SelectedInput};
pub use select::greedy_select;
