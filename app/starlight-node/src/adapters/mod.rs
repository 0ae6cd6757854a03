//! External-capability adapters. Persistent ingestion/task storage
//! and the IPFS/scanner internals are deliberately out of scope for
//! the core engine. These are the minimal real adapters the supervisor
//! binary needs to actually run the traits defined in
//! `reconciliation`, `sweep`, and `scanner-bridge` — never the
//! library crates themselves, which stay storage-agnostic.

pub mod ipfs;
pub mod json_store;
pub mod scanner;

pub use ipfs::HttpIpfsClient;
pub use json_store::{JsonFileIngestionStore, JsonFileSweepStore};
pub use scanner::ScannerBridgeClient;
