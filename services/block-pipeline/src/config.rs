use std::path::PathBuf;
use std::time::Duration;

/// Tuning knobs for the tip-follow loop.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Tick interval P (default 5 min).
    pub tick_interval: Duration,
    /// At most M blocks per tick (default 2).
    pub max_blocks_per_tick: u32,
    /// Minimum inter-block sleep S (default 5 s).
    pub min_inter_block_sleep: Duration,
    /// First-run seed: process the last R heights when internal height is 0 (default 3).
    pub first_run_seed: u64,
    /// Reorg-detection depth D (default 6).
    pub reorg_depth: u64,
    pub blocks_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5 * 60),
            max_blocks_per_tick: 2,
            min_inter_block_sleep: Duration::from_secs(5),
            first_run_seed: 3,
            reorg_depth: 6,
            blocks_dir: PathBuf::from("blocks"),
        }
    }
}

impl PipelineConfig {
    /// `BLOCKS_DIR` env var overrides the default `blocks` root;
    /// the rest keep their spec defaults until a future env surface
    /// names them.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("BLOCKS_DIR") {
            config.blocks_dir = PathBuf::from(dir);
        }
        config
    }
}
