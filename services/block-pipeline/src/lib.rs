//! Tip-follow loop, per-height FETCH ->
//! PARSE -> PERSIST_RAW -> SAVE_IMAGES -> SCAN -> BUILD_CONTRACTS ->
//! RECONCILE -> WRITE_SUMMARY state machine, reorg quarantine, and
//! the on-disk block directory layout.

pub mod config;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod reorg;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use layout::{
    block_dir_path, images_dir_path, rebuild_recent_blocks, reorgs_dir_path, ContractSummary, ImageSummary, InscriptionSummary, InscriptionsJson,
    RecentBlockSummary, RecentBlocksFile, StegoScanSummary,
};
pub use pipeline::{BlockMonitor, MonitorStats};
pub use reorg::detect_and_quarantine;
