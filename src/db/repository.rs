use std::sync::Arc;
use std::time::Duration;

use crate::core::{AppError, Clock, ListCache};
use crate::models::surveys::{Survey, SurveyDraft};

use super::{Record, RecordStore, SurveyStore};

/// Read-through access to one catalog table. Reads are answered from a
/// whole-table snapshot; every write drops the snapshot.
pub struct CachedRepository<R: Record> {
    store: Arc<dyn RecordStore<R>>,
    cache: ListCache<R>,
}

impl<R: Record> CachedRepository<R> {
    pub fn new(store: Arc<dyn RecordStore<R>>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cache: ListCache::new(ttl, clock),
        }
    }

    pub async fn list(&self) -> Result<Arc<Vec<R>>, AppError> {
        let store = Arc::clone(&self.store);
        self.cache
            .get_or_fetch(|| async move {
                tracing::debug!(kind = %R::KIND, "fetching full collection");
                store.fetch_all().await
            })
            .await
    }

    /// Drop the snapshot and read again.
    pub async fn refresh(&self) -> Result<Arc<Vec<R>>, AppError> {
        self.cache.invalidate();
        self.list().await
    }

    pub async fn find(&self, id: i64) -> Result<Option<R>, AppError> {
        let items = self.list().await?;
        Ok(items.iter().find(|item| item.id() == id).cloned())
    }

    pub async fn create(&self, draft: &R::Draft) -> Result<R, AppError> {
        let result = self.store.insert(draft).await;
        self.cache.invalidate();
        result
    }

    pub async fn update(&self, id: i64, draft: &R::Draft) -> Result<Option<R>, AppError> {
        let result = self.store.update(id, draft).await;
        self.cache.invalidate();
        result
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = self.store.delete(id).await;
        self.cache.invalidate();
        result
    }

    pub async fn record_download(&self, id: i64) -> Result<(), AppError> {
        let result = self.store.increment_downloads(id).await;
        self.cache.invalidate();
        result
    }
}

pub struct SurveyRepository {
    store: Arc<dyn SurveyStore>,
    cache: ListCache<Survey>,
}

impl SurveyRepository {
    pub fn new(store: Arc<dyn SurveyStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cache: ListCache::new(ttl, clock),
        }
    }

    pub async fn list(&self) -> Result<Arc<Vec<Survey>>, AppError> {
        let store = Arc::clone(&self.store);
        self.cache
            .get_or_fetch(|| async move { store.fetch_all().await })
            .await
    }

    pub async fn submit(&self, draft: &SurveyDraft) -> Result<Survey, AppError> {
        let result = self.store.insert(draft).await;
        self.cache.invalidate();
        result
    }
}
