use super::{LedgerStore, StoreError, StoreResult};
use crate::ledger::LedgerDocument;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, RwLock,
};

/// Shared in-memory store. Clones see the same document, so a test can keep
/// one clone to inspect what the ledger persisted through the other.
#[derive(Clone, Default)]
pub struct MemoryStore {
    document: Arc<RwLock<LedgerDocument>>,
    fail_writes: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("saves", &self.save_count())
            .field("fail_writes", &self.fail_writes.load(Ordering::SeqCst))
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: LedgerDocument) -> Self {
        let store = Self::default();
        if let Ok(mut guard) = store.document.write() {
            *guard = document;
        }
        store
    }

    /// Makes every subsequent `save` fail until turned off again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last successfully saved document.
    pub fn persisted(&self) -> LedgerDocument {
        self.document
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("memory store lock poisoned".to_string())
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> StoreResult<LedgerDocument> {
        let guard = self.document.read().map_err(|_| Self::poisoned())?;
        Ok(guard.clone())
    }

    fn save(&self, document: &LedgerDocument) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        let mut guard = self.document.write().map_err(|_| Self::poisoned())?;
        *guard = document.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
