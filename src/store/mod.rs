//! Snapshot storage boundary.
//!
//! Persistence lives outside the simulation core; this module fixes the
//! shape of what gets stored and the operations the pipelines need.
//! [`MemoryStore`] keeps everything in process and backs the server and tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The committed document for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    /// `YYYY-MM`
    pub period_key: String,
    pub body_text: String,
    /// Events that actually happened during this period, one `- Category: outcome` line each.
    /// Filled in by the turn that advances past this period.
    pub prior_events_text: Option<String>,
    /// Narrative of the changes that produced this snapshot.
    pub diff_narrative: Option<String>,
    /// Leadership report derived from the narrative.
    pub diff_report: Option<String>,
    /// Weighted candidate events for the coming period.
    pub candidate_events_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SnapshotDocument {
    pub fn new(period_key: impl Into<String>, body_text: impl Into<String>) -> Self {
        Self {
            period_key: period_key.into(),
            body_text: body_text.into(),
            prior_events_text: None,
            diff_narrative: None,
            diff_report: None,
            candidate_events_text: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_diff(mut self, narrative: impl Into<String>, report: impl Into<String>) -> Self {
        self.diff_narrative = Some(narrative.into());
        self.diff_report = Some(report.into());
        self
    }

    pub fn with_candidate_events(mut self, events: impl Into<String>) -> Self {
        self.candidate_events_text = Some(events.into());
        self
    }
}

/// A simulated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    pub flag_svg: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn create_entity(&self, name: &str) -> Result<EntityRecord>;

    async fn entity(&self, entity_id: &str) -> Result<Option<EntityRecord>>;

    async fn set_flag(&self, entity_id: &str, svg: &str) -> Result<()>;

    /// All snapshots in period order, oldest first.
    async fn snapshots(&self, entity_id: &str) -> Result<Vec<SnapshotDocument>>;

    /// Append a snapshot; its period must be later than every stored one.
    async fn append_snapshot(&self, entity_id: &str, snapshot: SnapshotDocument) -> Result<()>;

    /// Patch the event log of an existing snapshot.
    async fn record_events(&self, entity_id: &str, period_key: &str, events_text: &str)
    -> Result<()>;

    /// Commit a turn in one step: record `events_text` on `previous_period`
    /// and append `snapshot`. Nothing is written if either part is rejected.
    async fn commit_turn(
        &self,
        entity_id: &str,
        previous_period: &str,
        events_text: &str,
        snapshot: SnapshotDocument,
    ) -> Result<()>;

    /// The latest snapshot and the one before it.
    async fn latest_two(
        &self,
        entity_id: &str,
    ) -> Result<(Option<SnapshotDocument>, Option<SnapshotDocument>)> {
        let mut snapshots = self.snapshots(entity_id).await?;
        let latest = snapshots.pop();
        let previous = snapshots.pop();
        Ok((latest, previous))
    }
}

struct StoredEntity {
    record: EntityRecord,
    snapshots: Vec<SnapshotDocument>,
}

fn ensure_after(snapshots: &[SnapshotDocument], snapshot: &SnapshotDocument) -> Result<()> {
    if let Some(last) = snapshots.last()
        && last.period_key >= snapshot.period_key
    {
        anyhow::bail!(
            "Snapshot {} is not after the latest stored period {}",
            snapshot.period_key,
            last.period_key
        );
    }
    Ok(())
}

/// In-process store.
#[derive(Default)]
pub struct MemoryStore {
    entities: RwLock<HashMap<String, StoredEntity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn create_entity(&self, name: &str) -> Result<EntityRecord> {
        let record = EntityRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            flag_svg: None,
            created_at: Utc::now(),
        };
        self.entities.write().await.insert(
            record.id.clone(),
            StoredEntity {
                record: record.clone(),
                snapshots: Vec::new(),
            },
        );
        Ok(record)
    }

    async fn entity(&self, entity_id: &str) -> Result<Option<EntityRecord>> {
        Ok(self
            .entities
            .read()
            .await
            .get(entity_id)
            .map(|e| e.record.clone()))
    }

    async fn set_flag(&self, entity_id: &str, svg: &str) -> Result<()> {
        let mut entities = self.entities.write().await;
        let entity = entities
            .get_mut(entity_id)
            .with_context(|| format!("State {} not found", entity_id))?;
        entity.record.flag_svg = Some(svg.to_string());
        Ok(())
    }

    async fn snapshots(&self, entity_id: &str) -> Result<Vec<SnapshotDocument>> {
        Ok(self
            .entities
            .read()
            .await
            .get(entity_id)
            .map(|e| e.snapshots.clone())
            .unwrap_or_default())
    }

    async fn append_snapshot(&self, entity_id: &str, snapshot: SnapshotDocument) -> Result<()> {
        let mut entities = self.entities.write().await;
        let entity = entities
            .get_mut(entity_id)
            .with_context(|| format!("State {} not found", entity_id))?;
        ensure_after(&entity.snapshots, &snapshot)?;
        entity.snapshots.push(snapshot);
        Ok(())
    }

    async fn commit_turn(
        &self,
        entity_id: &str,
        previous_period: &str,
        events_text: &str,
        snapshot: SnapshotDocument,
    ) -> Result<()> {
        let mut entities = self.entities.write().await;
        let entity = entities
            .get_mut(entity_id)
            .with_context(|| format!("State {} not found", entity_id))?;
        ensure_after(&entity.snapshots, &snapshot)?;
        let previous = entity
            .snapshots
            .iter_mut()
            .find(|s| s.period_key == previous_period)
            .with_context(|| {
                format!("No snapshot for period {} of state {}", previous_period, entity_id)
            })?;
        previous.prior_events_text = Some(events_text.to_string());
        entity.snapshots.push(snapshot);
        Ok(())
    }

    async fn record_events(
        &self,
        entity_id: &str,
        period_key: &str,
        events_text: &str,
    ) -> Result<()> {
        let mut entities = self.entities.write().await;
        let entity = entities
            .get_mut(entity_id)
            .with_context(|| format!("State {} not found", entity_id))?;
        let snapshot = entity
            .snapshots
            .iter_mut()
            .find(|s| s.period_key == period_key)
            .with_context(|| format!("No snapshot for period {} of state {}", period_key, entity_id))?;
        snapshot.prior_events_text = Some(events_text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entity_lifecycle() {
        let store = MemoryStore::new();
        let entity = store.create_entity("Veloria").await.unwrap();
        assert_eq!(entity.name, "Veloria");
        assert!(!entity.id.is_empty());

        store.set_flag(&entity.id, "<svg/>").await.unwrap();
        let loaded = store.entity(&entity.id).await.unwrap().unwrap();
        assert_eq!(loaded.flag_svg.as_deref(), Some("<svg/>"));

        assert!(store.entity("missing").await.unwrap().is_none());
        assert!(store.set_flag("missing", "<svg/>").await.is_err());
    }

    #[tokio::test]
    async fn test_snapshots_are_ordered() {
        let store = MemoryStore::new();
        let id = store.create_entity("Veloria").await.unwrap().id;

        store
            .append_snapshot(&id, SnapshotDocument::new("2025-01", "first"))
            .await
            .unwrap();
        store
            .append_snapshot(&id, SnapshotDocument::new("2026-01", "second"))
            .await
            .unwrap();
        let err = store
            .append_snapshot(&id, SnapshotDocument::new("2026-01", "again"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not after"));

        let (latest, previous) = store.latest_two(&id).await.unwrap();
        assert_eq!(latest.unwrap().body_text, "second");
        assert_eq!(previous.unwrap().body_text, "first");
    }

    #[tokio::test]
    async fn test_latest_two_with_one_snapshot() {
        let store = MemoryStore::new();
        let id = store.create_entity("Veloria").await.unwrap().id;
        store
            .append_snapshot(&id, SnapshotDocument::new("2025-01", "only"))
            .await
            .unwrap();
        let (latest, previous) = store.latest_two(&id).await.unwrap();
        assert!(latest.is_some());
        assert!(previous.is_none());
    }

    #[tokio::test]
    async fn test_record_events_patches_in_place() {
        let store = MemoryStore::new();
        let id = store.create_entity("Veloria").await.unwrap().id;
        store
            .append_snapshot(&id, SnapshotDocument::new("2025-01", "body"))
            .await
            .unwrap();

        store
            .record_events(&id, "2025-01", "- Weather: Flood")
            .await
            .unwrap();
        let snapshots = store.snapshots(&id).await.unwrap();
        assert_eq!(snapshots[0].prior_events_text.as_deref(), Some("- Weather: Flood"));
        assert_eq!(snapshots[0].body_text, "body");

        assert!(store.record_events(&id, "1999-01", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_commit_turn_patches_and_appends() {
        let store = MemoryStore::new();
        let id = store.create_entity("Veloria").await.unwrap().id;
        store
            .append_snapshot(&id, SnapshotDocument::new("2025-01", "first"))
            .await
            .unwrap();

        store
            .commit_turn(&id, "2025-01", "- Weather: Flood", SnapshotDocument::new("2026-01", "second"))
            .await
            .unwrap();
        let snapshots = store.snapshots(&id).await.unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].prior_events_text.as_deref(), Some("- Weather: Flood"));
        assert!(snapshots[1].prior_events_text.is_none());
    }

    #[tokio::test]
    async fn test_rejected_commit_leaves_previous_snapshot_untouched() {
        let store = MemoryStore::new();
        let id = store.create_entity("Veloria").await.unwrap().id;
        store
            .append_snapshot(&id, SnapshotDocument::new("2025-01", "first"))
            .await
            .unwrap();

        let err = store
            .commit_turn(&id, "2025-01", "- Weather: Flood", SnapshotDocument::new("2025-01", "again"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not after"));

        let err = store
            .commit_turn(&id, "1999-01", "- Weather: Flood", SnapshotDocument::new("2026-01", "next"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No snapshot for period 1999-01"));

        let snapshots = store.snapshots(&id).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].prior_events_text.is_none());
    }
}
