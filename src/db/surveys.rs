use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::AppError;
use crate::models::surveys::{Survey, SurveyDraft};

use super::SurveyStore;

const SURVEY_COLUMNS: &str = "id, student_email, subjects, study_frequency, preferred_resources, \
     additional_comments, grade, province, satisfaction, would_recommend, timestamp";

pub struct PgSurveyStore {
    pool: PgPool,
}

impl PgSurveyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SurveyStore for PgSurveyStore {
    async fn fetch_all(&self) -> Result<Vec<Survey>, AppError> {
        let surveys = sqlx::query_as::<_, Survey>(&format!(
            "SELECT {} FROM surveys ORDER BY timestamp DESC, id DESC",
            SURVEY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(surveys)
    }

    async fn insert(&self, draft: &SurveyDraft) -> Result<Survey, AppError> {
        let survey = sqlx::query_as::<_, Survey>(&format!(
            r#"
            INSERT INTO surveys
            (student_email, subjects, study_frequency, preferred_resources, additional_comments,
             grade, province, satisfaction, would_recommend)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            SURVEY_COLUMNS
        ))
        .bind(&draft.student_email)
        .bind(&draft.subjects)
        .bind(draft.study_frequency.as_str())
        .bind(&draft.preferred_resources)
        .bind(&draft.additional_comments)
        .bind(&draft.grade)
        .bind(&draft.province)
        .bind(draft.satisfaction)
        .bind(draft.would_recommend)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(survey)
    }
}
