use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::core::AppError;
use crate::models::books::{Book, BookDraft};
use crate::models::resource_usage::ResourceKind;

use super::{Record, RecordStore};

const BOOK_COLUMNS: &str = "id, title, author, subject, grade, description, cover_image, download_url, \
     rating, pages, format, publisher, year, isbn, created_at";

impl Record for Book {
    type Draft = BookDraft;

    const KIND: ResourceKind = ResourceKind::Book;

    fn id(&self) -> i64 {
        self.id
    }

    fn download_url(&self) -> &str {
        &self.download_url
    }

    fn materialize(id: i64, created_at: DateTime<Utc>, draft: &BookDraft) -> Self {
        Book {
            id,
            title: draft.title.clone(),
            author: draft.author.clone(),
            subject: draft.subject.clone(),
            grade: draft.grade.clone(),
            description: draft.description.clone(),
            cover_image: draft.cover_image.clone(),
            download_url: draft.download_url.clone(),
            rating: draft.rating,
            pages: draft.pages,
            format: draft.format.clone(),
            publisher: draft.publisher.clone(),
            year: draft.year,
            isbn: draft.isbn.clone(),
            created_at,
        }
    }

    fn apply_draft(&mut self, draft: &BookDraft) {
        *self = Book::materialize(self.id, self.created_at, draft);
    }
}

pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore<Book> for PgBookStore {
    async fn fetch_all(&self) -> Result<Vec<Book>, AppError> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books ORDER BY created_at DESC, id DESC",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(books)
    }

    async fn insert(&self, draft: &BookDraft) -> Result<Book, AppError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books
            (title, author, subject, grade, description, cover_image, download_url, rating, pages, format, publisher, year, isbn)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.subject)
        .bind(&draft.grade)
        .bind(&draft.description)
        .bind(&draft.cover_image)
        .bind(&draft.download_url)
        .bind(draft.rating)
        .bind(draft.pages)
        .bind(&draft.format)
        .bind(&draft.publisher)
        .bind(draft.year)
        .bind(&draft.isbn)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(book)
    }

    async fn update(&self, id: i64, draft: &BookDraft) -> Result<Option<Book>, AppError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET title = $2, author = $3, subject = $4, grade = $5, description = $6, cover_image = $7,
                download_url = $8, rating = $9, pages = $10, format = $11, publisher = $12, year = $13, isbn = $14
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.subject)
        .bind(&draft.grade)
        .bind(&draft.description)
        .bind(&draft.cover_image)
        .bind(&draft.download_url)
        .bind(draft.rating)
        .bind(draft.pages)
        .bind(&draft.format)
        .bind(&draft.publisher)
        .bind(draft.year)
        .bind(&draft.isbn)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(book)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        Ok(result.rows_affected() > 0)
    }

    // Books carry no per-row counter; downloads are only logged as usage.
    async fn increment_downloads(&self, _id: i64) -> Result<(), AppError> {
        Ok(())
    }
}
