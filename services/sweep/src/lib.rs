//! Spends a hash-lock commitment
//! output by revealing its preimage. No signature is ever involved.

pub mod build;
pub mod engine;
pub mod error;
pub mod store;

pub use build::{build_sweep_transaction, sweep_fee, witness_vbytes, DUST_THRESHOLD};
pub use engine::{sweep_commitment_if_ready, SweepOutcome, DEFAULT_RETRY_COOLDOWN};
pub use error::{Result, SweepError};
pub use store::{StoreError, SweepStore, TaskFilter};

#[cfg(feature = "mock")]
pub use store::MockSweepStore;
