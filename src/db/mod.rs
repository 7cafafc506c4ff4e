use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::AppError;
use crate::models::resource_usage::{ResourceKind, UsageCount, UsageEvent};
use crate::models::surveys::{Survey, SurveyDraft};

pub mod books;
pub mod library;
pub mod memory;
pub mod papers;
pub mod repository;
pub mod resource_usage;
pub mod study_guides;
pub mod surveys;

pub use library::Library;
pub use repository::{CachedRepository, SurveyRepository};

/// A catalog row (paper, book, study guide) and the payload used to write it.
pub trait Record: Clone + Send + Sync + 'static {
    type Draft: Clone + Send + Sync + 'static;

    const KIND: ResourceKind;

    fn id(&self) -> i64;

    fn download_url(&self) -> &str;

    /// Build the row a store would return for `draft`.
    fn materialize(id: i64, created_at: DateTime<Utc>, draft: &Self::Draft) -> Self;

    /// Overwrite the editable columns with `draft`, keeping id, creation time
    /// and counters the way the SQL `UPDATE` does.
    fn apply_draft(&mut self, draft: &Self::Draft);

    /// Bump the per-row download counter, for entities that keep one.
    fn count_download(&mut self) {}
}

#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Every row, newest first.
    async fn fetch_all(&self) -> Result<Vec<R>, AppError>;

    async fn insert(&self, draft: &R::Draft) -> Result<R, AppError>;

    async fn update(&self, id: i64, draft: &R::Draft) -> Result<Option<R>, AppError>;

    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    async fn increment_downloads(&self, id: i64) -> Result<(), AppError>;
}

#[async_trait]
pub trait SurveyStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Survey>, AppError>;

    async fn insert(&self, draft: &SurveyDraft) -> Result<Survey, AppError>;
}

#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn record(&self, event: &UsageEvent) -> Result<(), AppError>;

    async fn summary(&self) -> Result<Vec<UsageCount>, AppError>;
}
