// motorpool_core/src/store/mod.rs

//! Durable storage for the ledger document plus filesystem and in-memory backends.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::ledger::LedgerDocument;
use std::{io, path::PathBuf};

pub type StoreResult<T> = Result<T, StoreError>;

/// The persistence substrate: a full-document read at startup and a
/// full-document rewrite after every mutation.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> StoreResult<LedgerDocument>;
    fn save(&self, document: &LedgerDocument) -> StoreResult<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ledger document encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub(crate) fn io_error(path: impl Into<PathBuf>, err: io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source: err,
    }
}
