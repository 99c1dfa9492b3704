use swarmdesk_core::data::DataError;
use swarmdesk_core::ledger::LedgerError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors from the desk.
#[derive(Debug, Error)]
pub enum DeskError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("cannot access {path}: {message}")]
    Io { path: String, message: String },
    #[error("snapshot error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported snapshot schema version {found} (max supported: {supported})")]
    SchemaVersion { found: u32, supported: u32 },
    #[error("cannot start scan workers: {0}")]
    ScanPool(#[from] rayon::ThreadPoolBuildError),
}
