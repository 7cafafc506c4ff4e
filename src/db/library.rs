use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::core::Clock;
use crate::models::books::Book;
use crate::models::papers::Paper;
use crate::models::study_guides::StudyGuide;

use super::books::PgBookStore;
use super::memory::{MemoryStore, MemorySurveyStore, MemoryUsageStore};
use super::papers::PgPaperStore;
use super::resource_usage::PgUsageStore;
use super::study_guides::PgStudyGuideStore;
use super::surveys::PgSurveyStore;
use super::{CachedRepository, RecordStore, SurveyRepository, SurveyStore, UsageStore};

/// Every data-access helper the handlers use, each with its own cache.
pub struct Library {
    pub papers: CachedRepository<Paper>,
    pub books: CachedRepository<Book>,
    pub study_guides: CachedRepository<StudyGuide>,
    pub surveys: SurveyRepository,
    pub usage: Arc<dyn UsageStore>,
}

pub struct LibraryStores {
    pub papers: Arc<dyn RecordStore<Paper>>,
    pub books: Arc<dyn RecordStore<Book>>,
    pub study_guides: Arc<dyn RecordStore<StudyGuide>>,
    pub surveys: Arc<dyn SurveyStore>,
    pub usage: Arc<dyn UsageStore>,
}

impl LibraryStores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            papers: Arc::new(PgPaperStore::new(pool.clone())),
            books: Arc::new(PgBookStore::new(pool.clone())),
            study_guides: Arc::new(PgStudyGuideStore::new(pool.clone())),
            surveys: Arc::new(PgSurveyStore::new(pool.clone())),
            usage: Arc::new(PgUsageStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            papers: Arc::new(MemoryStore::<Paper>::default()),
            books: Arc::new(MemoryStore::<Book>::default()),
            study_guides: Arc::new(MemoryStore::<StudyGuide>::default()),
            surveys: Arc::new(MemorySurveyStore::default()),
            usage: Arc::new(MemoryUsageStore::default()),
        }
    }
}

impl Library {
    pub fn new(stores: LibraryStores, cache_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            papers: CachedRepository::new(stores.papers, cache_ttl, clock.clone()),
            books: CachedRepository::new(stores.books, cache_ttl, clock.clone()),
            study_guides: CachedRepository::new(stores.study_guides, cache_ttl, clock.clone()),
            surveys: SurveyRepository::new(stores.surveys, cache_ttl, clock),
            usage: stores.usage,
        }
    }
}
