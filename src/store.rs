use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::plan::{EffectRating, EntryPayload, EntryRef, QueryFilters, QueryKind};

pub type EntryId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: EntryId,
    pub payload: EntryPayload,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub entries: Vec<DiaryEntry>,
    pub total: usize,
}

/// The diary store the Executor writes to. External collaborator; the
/// planner makes no read-after-write consistency assumption about it.
#[async_trait]
pub trait DiaryStore: Send + Sync {
    async fn create_entry(&self, payload: &EntryPayload) -> Result<EntryId, StoreError>;
    async fn query(&self, kind: QueryKind, filters: &QueryFilters) -> Result<QueryResult, StoreError>;
    async fn delete_entry(&self, entry: &EntryRef) -> Result<(), StoreError>;
    async fn update_effect(&self, entry: &EntryRef, effect: EffectRating) -> Result<(), StoreError>;
}

/// In-memory store for the demo driver and tests.
#[derive(Default)]
pub struct MemoryDiaryStore {
    entries: tokio::sync::Mutex<Vec<DiaryEntry>>,
}

impl MemoryDiaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn position(entries: &[DiaryEntry], entry_ref: &EntryRef) -> Option<usize> {
        match entry_ref {
            EntryRef::Id(id) => entries.iter().position(|e| e.id == *id),
            EntryRef::Date(date) => entries
                .iter()
                .position(|e| e.payload.timestamp.date() == *date),
            EntryRef::Latest => entries.len().checked_sub(1),
        }
    }
}

#[async_trait]
impl DiaryStore for MemoryDiaryStore {
    async fn create_entry(&self, payload: &EntryPayload) -> Result<EntryId, StoreError> {
        let mut entries = self.entries.lock().await;
        let entry = DiaryEntry {
            id: Uuid::new_v4(),
            payload: payload.clone(),
            created_at: chrono::Local::now().naive_local(),
        };
        let id = entry.id;
        entries.push(entry);
        Ok(id)
    }

    async fn query(&self, _kind: QueryKind, filters: &QueryFilters) -> Result<QueryResult, StoreError> {
        let entries = self.entries.lock().await;
        let matched: Vec<DiaryEntry> = entries
            .iter()
            .filter(|e| {
                let date = e.payload.timestamp.date();
                filters.from.map_or(true, |from| date >= from)
                    && filters.to.map_or(true, |to| date <= to)
                    && filters.min_pain.map_or(true, |min| {
                        e.payload.pain_level.map_or(false, |p| p >= min)
                    })
                    && filters.medication.as_ref().map_or(true, |name| {
                        e.payload
                            .medications
                            .iter()
                            .any(|m| m.name.eq_ignore_ascii_case(name))
                    })
            })
            .cloned()
            .collect();
        let total = matched.len();
        Ok(QueryResult {
            entries: matched,
            total,
        })
    }

    async fn delete_entry(&self, entry: &EntryRef) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        match Self::position(&entries, entry) {
            Some(idx) => {
                entries.remove(idx);
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn update_effect(&self, entry: &EntryRef, effect: EffectRating) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        match Self::position(&entries, entry) {
            Some(idx) => {
                entries[idx].payload.effect = Some(effect);
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}
