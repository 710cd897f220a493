//! Video record store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use mgen_models::{Page, UserId, VideoId, VideoRecord, VideoStatus, VideoUpdate};

use crate::error::{StoreError, StoreResult};

/// One page of an owner's records.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoListing {
    pub items: Vec<VideoRecord>,
    /// Records the owner has in total
    pub total: usize,
    pub page: Page,
}

#[async_trait]
pub trait VideoRecordStore: Send + Sync {
    async fn create(
        &self,
        owner: &UserId,
        prompt: &str,
        status: VideoStatus,
    ) -> StoreResult<VideoRecord>;

    /// Apply `update` and return the updated record.
    async fn update(&self, id: &VideoId, update: VideoUpdate) -> StoreResult<VideoRecord>;

    async fn find_by_id(&self, id: &VideoId) -> StoreResult<Option<VideoRecord>>;

    /// Owner's records, newest first.
    async fn find_by_owner(&self, owner: &UserId, page: Page) -> StoreResult<VideoListing>;
}

/// Records held in memory. Insertion order breaks `created_at` ties.
#[derive(Default)]
pub struct InMemoryVideoStore {
    records: RwLock<HashMap<VideoId, (u64, VideoRecord)>>,
}

impl InMemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRecordStore for InMemoryVideoStore {
    async fn create(
        &self,
        owner: &UserId,
        prompt: &str,
        status: VideoStatus,
    ) -> StoreResult<VideoRecord> {
        let record = VideoRecord::new(owner.clone(), prompt, status);

        let mut records = self.records.write().await;
        let seq = records.len() as u64;
        records.insert(record.id.clone(), (seq, record.clone()));
        Ok(record)
    }

    async fn update(&self, id: &VideoId, update: VideoUpdate) -> StoreResult<VideoRecord> {
        let mut records = self.records.write().await;
        let (_, record) = records
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("video {}", id)))?;
        record.apply(update);
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: &VideoId) -> StoreResult<Option<VideoRecord>> {
        let records = self.records.read().await;
        Ok(records.get(id).map(|(_, r)| r.clone()))
    }

    async fn find_by_owner(&self, owner: &UserId, page: Page) -> StoreResult<VideoListing> {
        let records = self.records.read().await;

        let mut owned: Vec<&(u64, VideoRecord)> = records
            .values()
            .filter(|(_, r)| r.is_owned_by(owner))
            .collect();
        owned.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));

        let total = owned.len();
        let items = owned
            .into_iter()
            .skip(page.offset())
            .take(page.per_page as usize)
            .map(|(_, r)| r.clone())
            .collect();

        Ok(VideoListing { items, total, page })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_update_find() {
        let store = InMemoryVideoStore::new();
        let owner = UserId::new();
        let record = store
            .create(&owner, "draw a circle", VideoStatus::Processing)
            .await
            .unwrap();

        let updated = store
            .update(
                &record.id,
                VideoUpdate::status(VideoStatus::Failed).with_error("boom"),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, VideoStatus::Failed);
        assert_eq!(updated.error_message.as_deref(), Some("boom"));

        let found = store.find_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(found, updated);
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = InMemoryVideoStore::new();
        let err = store
            .update(&VideoId::new(), VideoUpdate::status(VideoStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_by_owner_newest_first_and_paged() {
        let store = InMemoryVideoStore::new();
        let owner = UserId::new();
        let other = UserId::new();

        for i in 0..5 {
            store
                .create(&owner, &format!("prompt {}", i), VideoStatus::Pending)
                .await
                .unwrap();
        }
        store
            .create(&other, "not mine", VideoStatus::Pending)
            .await
            .unwrap();

        let first = store.find_by_owner(&owner, Page::new(1, 2)).await.unwrap();
        assert_eq!(first.total, 5);
        let prompts: Vec<_> = first.items.iter().map(|r| r.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["prompt 4", "prompt 3"]);

        let last = store.find_by_owner(&owner, Page::new(3, 2)).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].prompt, "prompt 0");

        let beyond = store.find_by_owner(&owner, Page::new(9, 2)).await.unwrap();
        assert!(beyond.items.is_empty());
    }
}
