//! Binds off-chain ingestion records
//! to confirmed on-chain transactions via scan-driven and oracle
//! matching, relocates matched images, and drives task-proof sweeps.

pub mod block;
pub mod candidate;
pub mod error;
pub mod oracle;
pub mod periodic;
pub mod relocate;
pub mod reorg;
pub mod scan_driven;
pub mod tasks;
pub mod traits;

pub use block::{reconcile_block, ReconcileConfig};
pub use error::{ReconcileError, Result};
pub use oracle::{reconcile_oracle_block, MatchType, OracleMatch};
pub use periodic::{periodic_reconcile_sweep, ReprocessBlock, DEFAULT_PERIODIC_BLOCK_COUNT, DEFAULT_PERIODIC_INTERVAL};
pub use scan_driven::{reconcile_scan_driven, ScanMatch};
pub use traits::{CapabilityError, IngestionFilter, IngestionStore, IpfsClient};

#[cfg(feature = "mock")]
pub use traits::{MockIngestionStore, MockIpfsClient};
