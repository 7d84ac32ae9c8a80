// motorpool_core/src/ledger/record.rs

use crate::types::{ActorId, ResourceHandle, ResourceKind, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the spawner knows about one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorRecord {
    /// Last successful spawn per kind, for the spawn cooldown.
    #[serde(default)]
    pub last_operation_time: BTreeMap<ResourceKind, Timestamp>,
    /// Resources currently attributed to this actor, in spawn order.
    #[serde(default)]
    pub resource_handles: Vec<ResourceHandle>,
    /// Maximum number of simultaneously held resources.
    pub quota: u32,
    /// Last fetch/destroy that matched a resource. Process-local, never persisted.
    #[serde(skip)]
    pub last_rate_limited_at: Option<Timestamp>,
}

impl ActorRecord {
    pub fn new(quota: u32) -> Self {
        Self {
            last_operation_time: BTreeMap::new(),
            resource_handles: Vec::new(),
            quota,
            last_rate_limited_at: None,
        }
    }

    pub fn held(&self) -> usize {
        self.resource_handles.len()
    }

    pub fn owns(&self, handle: ResourceHandle) -> bool {
        self.resource_handles.contains(&handle)
    }

    /// Most-recently-spawned handle of `kind`.
    pub fn latest_of(&self, kind: ResourceKind) -> Option<ResourceHandle> {
        self.resource_handles
            .iter()
            .rev()
            .find(|handle| handle.kind == kind)
            .copied()
    }

    pub fn last_spawn(&self, kind: ResourceKind) -> Option<Timestamp> {
        self.last_operation_time.get(&kind).copied()
    }
}

/// The persisted form of the whole ledger. Written in full on every mutation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default)]
    pub actors: BTreeMap<ActorId, ActorRecord>,
    /// The last handle id handed out. Survives wipes so ids never repeat.
    #[serde(default)]
    pub last_handle_id: u64,
}

impl LedgerDocument {
    /// No actor records. The handle counter is not considered.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// The largest id among all held handles, 0 if none.
    pub fn highest_handle_id(&self) -> u64 {
        self.actors
            .values()
            .flat_map(|record| record.resource_handles.iter())
            .map(|handle| handle.id)
            .max()
            .unwrap_or(0)
    }

    /// Which actor, if any, currently owns `handle`.
    pub fn owner_of(&self, handle: ResourceHandle) -> Option<ActorId> {
        self.actors
            .iter()
            .find(|(_, record)| record.owns(handle))
            .map(|(actor, _)| *actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_serializes_in_the_persisted_shape() {
        let mut record = ActorRecord::new(3);
        record
            .resource_handles
            .push(ResourceHandle::new(42, ResourceKind::Car));
        record
            .last_operation_time
            .insert(ResourceKind::Car, Timestamp::from_secs(1_700_000_000.0));
        record.last_rate_limited_at = Some(Timestamp::from_secs(5.0));

        let mut doc = LedgerDocument::default();
        doc.actors.insert(ActorId(7), record);

        let json = serde_json::to_value(&doc).unwrap();
        let actor = &json["actors"]["7"];
        assert_eq!(actor["quota"], 3);
        assert_eq!(actor["last_operation_time"]["car"], 1_700_000_000.0);
        assert_eq!(actor["resource_handles"][0]["id"], 42);
        assert_eq!(actor["resource_handles"][0]["kind"], "car");
        assert!(actor.get("last_rate_limited_at").is_none());
        assert_eq!(json["last_handle_id"], 0);
    }

    #[test]
    fn older_documents_without_counter_still_load() {
        let doc: LedgerDocument = serde_json::from_str(
            r#"{"actors":{"7":{"quota":1,"resource_handles":[{"id":9,"kind":"car"},{"id":4,"kind":"helicopter"}]}}}"#,
        )
        .unwrap();
        assert_eq!(doc.last_handle_id, 0);
        assert_eq!(doc.highest_handle_id(), 9);
        assert_eq!(LedgerDocument::default().highest_handle_id(), 0);
    }

    #[test]
    fn latest_of_scans_newest_first() {
        let mut record = ActorRecord::new(6);
        record.resource_handles = vec![
            ResourceHandle::new(1, ResourceKind::Car),
            ResourceHandle::new(2, ResourceKind::Helicopter),
            ResourceHandle::new(3, ResourceKind::Car),
        ];
        assert_eq!(record.latest_of(ResourceKind::Car).map(|h| h.id), Some(3));
        assert_eq!(
            record.latest_of(ResourceKind::Helicopter).map(|h| h.id),
            Some(2)
        );
    }
}
