use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::core::AppError;
use crate::models::resource_usage::ResourceKind;
use crate::models::study_guides::{StudyGuide, StudyGuideDraft};

use super::{Record, RecordStore};

const STUDY_GUIDE_COLUMNS: &str = "id, title, subject, grade, topic, description, author, difficulty, \
     estimated_time, download_url, preview_url, rating, downloads, pages, format, last_updated, tags, created_at";

impl Record for StudyGuide {
    type Draft = StudyGuideDraft;

    const KIND: ResourceKind = ResourceKind::StudyGuide;

    fn id(&self) -> i64 {
        self.id
    }

    fn download_url(&self) -> &str {
        &self.download_url
    }

    fn materialize(id: i64, created_at: DateTime<Utc>, draft: &StudyGuideDraft) -> Self {
        StudyGuide {
            id,
            title: draft.title.clone(),
            subject: draft.subject.clone(),
            grade: draft.grade.clone(),
            topic: draft.topic.clone(),
            description: draft.description.clone(),
            author: draft.author.clone(),
            difficulty: draft.difficulty,
            estimated_time: draft.estimated_time.clone(),
            download_url: draft.download_url.clone(),
            preview_url: draft.preview_url.clone(),
            rating: draft.rating,
            downloads: 0,
            pages: draft.pages,
            format: draft.format.clone(),
            last_updated: draft.last_updated,
            tags: draft.tags.clone(),
            created_at,
        }
    }

    fn apply_draft(&mut self, draft: &StudyGuideDraft) {
        *self = StudyGuide {
            downloads: self.downloads,
            ..StudyGuide::materialize(self.id, self.created_at, draft)
        };
    }

    fn count_download(&mut self) {
        self.downloads += 1;
    }
}

pub struct PgStudyGuideStore {
    pool: PgPool,
}

impl PgStudyGuideStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore<StudyGuide> for PgStudyGuideStore {
    async fn fetch_all(&self) -> Result<Vec<StudyGuide>, AppError> {
        let guides = sqlx::query_as::<_, StudyGuide>(&format!(
            "SELECT {} FROM study_guides ORDER BY created_at DESC, id DESC",
            STUDY_GUIDE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(guides)
    }

    async fn insert(&self, draft: &StudyGuideDraft) -> Result<StudyGuide, AppError> {
        let guide = sqlx::query_as::<_, StudyGuide>(&format!(
            r#"
            INSERT INTO study_guides
            (title, subject, grade, topic, description, author, difficulty, estimated_time,
             download_url, preview_url, rating, pages, format, last_updated, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            STUDY_GUIDE_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.subject)
        .bind(&draft.grade)
        .bind(&draft.topic)
        .bind(&draft.description)
        .bind(&draft.author)
        .bind(draft.difficulty.as_str())
        .bind(&draft.estimated_time)
        .bind(&draft.download_url)
        .bind(&draft.preview_url)
        .bind(draft.rating)
        .bind(draft.pages)
        .bind(&draft.format)
        .bind(draft.last_updated)
        .bind(&draft.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(guide)
    }

    async fn update(&self, id: i64, draft: &StudyGuideDraft) -> Result<Option<StudyGuide>, AppError> {
        let guide = sqlx::query_as::<_, StudyGuide>(&format!(
            r#"
            UPDATE study_guides
            SET title = $2, subject = $3, grade = $4, topic = $5, description = $6, author = $7,
                difficulty = $8, estimated_time = $9, download_url = $10, preview_url = $11,
                rating = $12, pages = $13, format = $14, last_updated = $15, tags = $16
            WHERE id = $1
            RETURNING {}
            "#,
            STUDY_GUIDE_COLUMNS
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.subject)
        .bind(&draft.grade)
        .bind(&draft.topic)
        .bind(&draft.description)
        .bind(&draft.author)
        .bind(draft.difficulty.as_str())
        .bind(&draft.estimated_time)
        .bind(&draft.download_url)
        .bind(&draft.preview_url)
        .bind(draft.rating)
        .bind(draft.pages)
        .bind(&draft.format)
        .bind(draft.last_updated)
        .bind(&draft.tags)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(guide)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM study_guides WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_downloads(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE study_guides SET downloads = downloads + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("study guide {} not found", id)));
        }
        Ok(())
    }
}
