//! Process-local stores with the same contract as the Postgres ones. The test
//! suite builds the whole app on top of these.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::core::AppError;
use crate::models::resource_usage::{UsageCount, UsageEvent};
use crate::models::surveys::{Survey, SurveyDraft};

use super::{Record, RecordStore, SurveyStore, UsageStore};

struct Rows<R> {
    next_id: i64,
    rows: Vec<R>,
}

pub struct MemoryStore<R> {
    rows: Mutex<Rows<R>>,
    fetches: AtomicUsize,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(Rows {
                next_id: 1,
                rows: Vec::new(),
            }),
            fetches: AtomicUsize::new(0),
        }
    }
}

impl<R> MemoryStore<R> {
    fn lock(&self) -> MutexGuard<'_, Rows<R>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// How many full-table reads have been served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl<R: Record> MemoryStore<R> {
    /// Insert with a caller-chosen id, e.g. to reproduce a known record.
    pub fn seed(&self, id: i64, draft: &R::Draft) -> R {
        let mut rows = self.lock();
        let record = R::materialize(id, Utc::now(), draft);
        rows.rows.retain(|row| row.id() != id);
        rows.rows.push(record.clone());
        rows.next_id = rows.next_id.max(id + 1);
        record
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn fetch_all(&self) -> Result<Vec<R>, AppError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        // Rows are appended, so reversing yields newest first.
        Ok(self.lock().rows.iter().rev().cloned().collect())
    }

    async fn insert(&self, draft: &R::Draft) -> Result<R, AppError> {
        let mut rows = self.lock();
        let id = rows.next_id;
        rows.next_id += 1;
        let record = R::materialize(id, Utc::now(), draft);
        rows.rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: i64, draft: &R::Draft) -> Result<Option<R>, AppError> {
        let mut rows = self.lock();
        Ok(rows.rows.iter_mut().find(|row| row.id() == id).map(|row| {
            row.apply_draft(draft);
            row.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut rows = self.lock();
        let before = rows.rows.len();
        rows.rows.retain(|row| row.id() != id);
        Ok(rows.rows.len() != before)
    }

    async fn increment_downloads(&self, id: i64) -> Result<(), AppError> {
        let mut rows = self.lock();
        match rows.rows.iter_mut().find(|row| row.id() == id) {
            Some(row) => {
                row.count_download();
                Ok(())
            }
            None => Err(AppError::not_found(format!("{} {} not found", R::KIND, id))),
        }
    }
}

#[derive(Default)]
pub struct MemorySurveyStore {
    surveys: Mutex<Vec<Survey>>,
    inserts: AtomicUsize,
}

impl MemorySurveyStore {
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SurveyStore for MemorySurveyStore {
    async fn fetch_all(&self) -> Result<Vec<Survey>, AppError> {
        let surveys = self.surveys.lock().unwrap_or_else(|e| e.into_inner());
        Ok(surveys.iter().rev().cloned().collect())
    }

    async fn insert(&self, draft: &SurveyDraft) -> Result<Survey, AppError> {
        let mut surveys = self.surveys.lock().unwrap_or_else(|e| e.into_inner());
        self.inserts.fetch_add(1, Ordering::SeqCst);

        let survey = Survey {
            id: surveys.len() as i64 + 1,
            student_email: draft.student_email.clone(),
            subjects: draft.subjects.clone(),
            study_frequency: draft.study_frequency,
            preferred_resources: draft.preferred_resources.clone(),
            additional_comments: draft.additional_comments.clone(),
            grade: draft.grade.clone(),
            province: draft.province.clone(),
            satisfaction: draft.satisfaction,
            would_recommend: draft.would_recommend,
            timestamp: Utc::now(),
        };
        surveys.push(survey.clone());
        Ok(survey)
    }
}

#[derive(Default)]
pub struct MemoryUsageStore {
    events: Mutex<Vec<UsageEvent>>,
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn record(&self, event: &UsageEvent) -> Result<(), AppError> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }

    async fn summary(&self) -> Result<Vec<UsageCount>, AppError> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let mut counts: HashMap<&'static str, i64> = HashMap::new();
        for event in events.iter() {
            *counts.entry(event.resource_type.as_str()).or_insert(0) += 1;
        }

        let mut summary: Vec<UsageCount> = counts
            .into_iter()
            .map(|(resource_type, downloads)| UsageCount {
                resource_type: resource_type.to_string(),
                downloads,
            })
            .collect();
        summary.sort_by(|a, b| a.resource_type.cmp(&b.resource_type));
        Ok(summary)
    }
}
