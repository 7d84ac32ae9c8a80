// motorpool_core/src/ledger/mod.rs

//! The Lifecycle Ledger: owns every `ActorRecord`, applies the effects of
//! allowed operations and writes the full document through to the store
//! before reporting success.

mod record;

pub use record::{ActorRecord, LedgerDocument};

use crate::store::{LedgerStore, StoreError};
use crate::types::{ActorId, ResourceHandle, ResourceKind, Timestamp};
use tracing::{debug, error, info};

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{handle} is already owned by actor {owner}")]
    AlreadyOwned {
        handle: ResourceHandle,
        owner: ActorId,
    },
    #[error("actor {actor} does not own {handle}")]
    NotOwned {
        actor: ActorId,
        handle: ResourceHandle,
    },
    #[error("failed to persist ledger: {0}")]
    Store(#[from] StoreError),
}

pub struct Ledger {
    document: LedgerDocument,
    store: Box<dyn LedgerStore>,
    /// Quota given to records created lazily, before any tier evaluation.
    default_quota: u32,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("actors", &self.document.actors.len())
            .field("default_quota", &self.default_quota)
            .finish()
    }
}

impl Ledger {
    /// Reads the full document from `store`.
    pub fn open(store: impl LedgerStore + 'static, default_quota: u32) -> LedgerResult<Self> {
        let mut document = store.load()?;
        // Documents written before the counter existed, or edited by hand.
        document.last_handle_id = document.last_handle_id.max(document.highest_handle_id());
        info!(
            "Loaded vehicle ledger with {} actor record(s).",
            document.actors.len()
        );
        Ok(Self {
            document,
            store: Box::new(store),
            default_quota,
        })
    }

    /// Starts from an empty document without reading `store`. Used when the
    /// stored document cannot be read and must be left as it is.
    pub fn empty(store: impl LedgerStore + 'static, default_quota: u32) -> Self {
        Self {
            document: LedgerDocument::default(),
            store: Box::new(store),
            default_quota,
        }
    }

    pub fn document(&self) -> &LedgerDocument {
        &self.document
    }

    pub fn record(&self, actor: ActorId) -> Option<&ActorRecord> {
        self.document.actors.get(&actor)
    }

    pub fn default_quota(&self) -> u32 {
        self.default_quota
    }

    fn record_mut(&mut self, actor: ActorId) -> &mut ActorRecord {
        let quota = self.default_quota;
        self.document
            .actors
            .entry(actor)
            .or_insert_with(|| ActorRecord::new(quota))
    }

    #[cfg(test)]
    pub(crate) fn document_mut(&mut self) -> &mut LedgerDocument {
        &mut self.document
    }

    fn persist(&self) -> LedgerResult<()> {
        self.store.save(&self.document).map_err(|err| {
            // The world-side effect has already happened; the ledger on disk
            // is now behind the world.
            error!("Failed to persist vehicle ledger: {}", err);
            LedgerError::Store(err)
        })
    }

    /// Issues the handle for a resource about to be spawned. The id is never
    /// issued again; it reaches the store with the next write.
    pub fn reserve_handle(&mut self, kind: ResourceKind) -> ResourceHandle {
        self.document.last_handle_id += 1;
        ResourceHandle::new(self.document.last_handle_id, kind)
    }

    /// Records a freshly spawned resource. Call only after the entity engine
    /// reported success.
    pub fn register_spawn(
        &mut self,
        actor: ActorId,
        handle: ResourceHandle,
        now: Timestamp,
    ) -> LedgerResult<()> {
        if let Some(owner) = self.document.owner_of(handle) {
            return Err(LedgerError::AlreadyOwned { handle, owner });
        }
        let record = self.record_mut(actor);
        record.resource_handles.push(handle);
        let stamp = record
            .last_spawn(handle.kind)
            .map_or(now, |previous| previous.max(now));
        record.last_operation_time.insert(handle.kind, stamp);
        debug!("Registered {} for actor {}.", handle, actor);
        self.persist()
    }

    /// The most recently spawned handle of `kind` owned by `actor`.
    pub fn select_for_operation(&self, actor: ActorId, kind: ResourceKind) -> Option<ResourceHandle> {
        self.record(actor)?.latest_of(kind)
    }

    /// Drops `handle` from `actor` after the entity engine destroyed it.
    pub fn release(&mut self, actor: ActorId, handle: ResourceHandle) -> LedgerResult<()> {
        if !self.remove_handle(actor, handle) {
            return Err(LedgerError::NotOwned { actor, handle });
        }
        debug!("Released {} from actor {}.", handle, actor);
        self.persist()
    }

    /// Drops a handle whose world entity no longer exists. Returns whether
    /// anything was removed.
    pub fn prune(&mut self, actor: ActorId, handle: ResourceHandle) -> LedgerResult<bool> {
        if !self.remove_handle(actor, handle) {
            return Ok(false);
        }
        info!(
            "Pruned {} from actor {}: the world entity is gone.",
            handle, actor
        );
        self.persist()?;
        Ok(true)
    }

    fn remove_handle(&mut self, actor: ActorId, handle: ResourceHandle) -> bool {
        let Some(record) = self.document.actors.get_mut(&actor) else {
            return false;
        };
        let Some(index) = record.resource_handles.iter().position(|h| *h == handle) else {
            return false;
        };
        record.resource_handles.remove(index);
        true
    }

    /// Drops every handle, across all actors, for which `is_live` is false.
    /// Writes once if anything was removed. Returns how many were dropped.
    pub fn retain_live(&mut self, is_live: impl Fn(ResourceHandle) -> bool) -> LedgerResult<usize> {
        let mut dropped = 0;
        for (actor, record) in self.document.actors.iter_mut() {
            let before = record.resource_handles.len();
            record.resource_handles.retain(|handle| is_live(*handle));
            let gone = before - record.resource_handles.len();
            if gone > 0 {
                info!("Dropped {} vanished vehicle(s) from actor {}.", gone, actor);
            }
            dropped += gone;
        }
        if dropped > 0 {
            self.persist()?;
        }
        Ok(dropped)
    }

    /// A fetch moved `handle`; ownership is unchanged, only the fetch/destroy
    /// limiter is stamped.
    pub fn relocate_mark(
        &mut self,
        actor: ActorId,
        handle: ResourceHandle,
        now: Timestamp,
    ) -> LedgerResult<()> {
        if !self.record(actor).is_some_and(|record| record.owns(handle)) {
            return Err(LedgerError::NotOwned { actor, handle });
        }
        self.mark_rate_limited(actor, now);
        Ok(())
    }

    /// Stamps the transient fetch/destroy limiter. Not persisted.
    pub fn mark_rate_limited(&mut self, actor: ActorId, now: Timestamp) {
        self.record_mut(actor).last_rate_limited_at = Some(now);
    }

    /// Overwrites `actor`'s quota. Existing handles are never evicted, even if
    /// they now exceed it.
    pub fn set_quota(&mut self, actor: ActorId, quota: u32) -> LedgerResult<()> {
        self.record_mut(actor).quota = quota;
        info!("Quota for actor {} set to {}.", actor, quota);
        self.persist()
    }

    /// Like `set_quota`, but skips the write when nothing changes. Returns
    /// whether the ledger was modified.
    pub fn refresh_quota(&mut self, actor: ActorId, quota: u32) -> LedgerResult<bool> {
        if self.record(actor).is_some_and(|record| record.quota == quota) {
            return Ok(false);
        }
        self.set_quota(actor, quota)?;
        Ok(true)
    }

    /// Clears every record. Irreversible; persisted immediately. The handle
    /// counter is kept.
    pub fn wipe_all(&mut self) -> LedgerResult<()> {
        self.document = LedgerDocument {
            last_handle_id: self.document.last_handle_id,
            ..LedgerDocument::default()
        };
        info!("Vehicle ledger wiped.");
        self.persist()
    }

    /// Writes the current state again, e.g. on a host save tick.
    pub fn flush(&self) -> LedgerResult<()> {
        self.persist()
    }
}
