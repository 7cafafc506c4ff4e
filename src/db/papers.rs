use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::core::AppError;
use crate::models::papers::{Paper, PaperDraft};
use crate::models::resource_usage::ResourceKind;

use super::{Record, RecordStore};

const PAPER_COLUMNS: &str = "id, title, grade, subject, province, exam_type, year, description, \
     publisher, format, identifier, download_url, download_count, created_at";

impl Record for Paper {
    type Draft = PaperDraft;

    const KIND: ResourceKind = ResourceKind::Paper;

    fn id(&self) -> i64 {
        self.id
    }

    fn download_url(&self) -> &str {
        &self.download_url
    }

    fn materialize(id: i64, created_at: DateTime<Utc>, draft: &PaperDraft) -> Self {
        Paper {
            id,
            title: draft.title.clone(),
            grade: draft.grade.clone(),
            subject: draft.subject.clone(),
            province: draft.province.clone(),
            exam_type: draft.exam_type.clone(),
            year: draft.year.clone(),
            description: draft.description.clone(),
            publisher: draft.publisher.clone(),
            format: draft.format.clone(),
            identifier: draft.identifier.clone(),
            download_url: draft.download_url.clone(),
            download_count: 0,
            created_at,
        }
    }

    fn apply_draft(&mut self, draft: &PaperDraft) {
        *self = Paper {
            download_count: self.download_count,
            ..Paper::materialize(self.id, self.created_at, draft)
        };
    }

    fn count_download(&mut self) {
        self.download_count += 1;
    }
}

pub struct PgPaperStore {
    pool: PgPool,
}

impl PgPaperStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore<Paper> for PgPaperStore {
    async fn fetch_all(&self) -> Result<Vec<Paper>, AppError> {
        let papers = sqlx::query_as::<_, Paper>(&format!(
            "SELECT {} FROM papers ORDER BY created_at DESC, id DESC",
            PAPER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(papers)
    }

    async fn insert(&self, draft: &PaperDraft) -> Result<Paper, AppError> {
        let paper = sqlx::query_as::<_, Paper>(&format!(
            r#"
            INSERT INTO papers
            (title, grade, subject, province, exam_type, year, description, publisher, format, identifier, download_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            PAPER_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.grade)
        .bind(&draft.subject)
        .bind(&draft.province)
        .bind(&draft.exam_type)
        .bind(&draft.year)
        .bind(&draft.description)
        .bind(&draft.publisher)
        .bind(&draft.format)
        .bind(&draft.identifier)
        .bind(&draft.download_url)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(paper)
    }

    async fn update(&self, id: i64, draft: &PaperDraft) -> Result<Option<Paper>, AppError> {
        let paper = sqlx::query_as::<_, Paper>(&format!(
            r#"
            UPDATE papers
            SET title = $2, grade = $3, subject = $4, province = $5, exam_type = $6, year = $7,
                description = $8, publisher = $9, format = $10, identifier = $11, download_url = $12
            WHERE id = $1
            RETURNING {}
            "#,
            PAPER_COLUMNS
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.grade)
        .bind(&draft.subject)
        .bind(&draft.province)
        .bind(&draft.exam_type)
        .bind(&draft.year)
        .bind(&draft.description)
        .bind(&draft.publisher)
        .bind(&draft.format)
        .bind(&draft.identifier)
        .bind(&draft.download_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(paper)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM papers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_downloads(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE papers SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("paper {} not found", id)));
        }
        Ok(())
    }
}
