use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::borrow::Cow;
use std::collections::HashMap;
use validator::Validate;

use super::listing::{Facet, ListQuery, Listable, SortKey, SortOrder, SortValue};
use super::pagination::PaginationQuery;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub grade: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub download_url: String,
    pub rating: Option<f64>,
    pub pages: Option<i32>,
    pub format: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub isbn: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Grade is required"))]
    pub grade: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub download_url: String,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
    #[validate(range(min = 1, message = "Pages must be positive"))]
    pub pages: Option<i32>,
    pub format: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub isbn: Option<String>,
}

impl BookDraft {
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, String> {
        let text = |key: &str| fields.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
        let optional = |key: &str| {
            fields
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            title: text("title"),
            author: text("author"),
            subject: text("subject"),
            grade: text("grade"),
            description: optional("description"),
            cover_image: None,
            download_url: String::new(),
            rating: parse_optional(optional("rating"), "rating")?,
            pages: parse_optional(optional("pages"), "pages")?,
            format: optional("format"),
            publisher: optional("publisher"),
            year: parse_optional(optional("year"), "year")?,
            isbn: optional("isbn"),
        })
    }
}

fn parse_optional<T: std::str::FromStr>(value: Option<String>, field: &str) -> Result<Option<T>, String> {
    value
        .map(|v| v.parse::<T>().map_err(|_| format!("{} must be a number", field)))
        .transpose()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub grade: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub download_url: Option<String>,
    pub rating: Option<f64>,
    pub pages: Option<i32>,
    pub format: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub isbn: Option<String>,
}

impl BookUpdate {
    pub fn apply(self, current: &Book) -> BookDraft {
        BookDraft {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            author: self.author.unwrap_or_else(|| current.author.clone()),
            subject: self.subject.unwrap_or_else(|| current.subject.clone()),
            grade: self.grade.unwrap_or_else(|| current.grade.clone()),
            description: self.description.or_else(|| current.description.clone()),
            cover_image: self.cover_image.or_else(|| current.cover_image.clone()),
            download_url: self
                .download_url
                .unwrap_or_else(|| current.download_url.clone()),
            rating: self.rating.or(current.rating),
            pages: self.pages.or(current.pages),
            format: self.format.or_else(|| current.format.clone()),
            publisher: self.publisher.or_else(|| current.publisher.clone()),
            year: self.year.or(current.year),
            isbn: self.isbn.or_else(|| current.isbn.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSort {
    #[default]
    Newest,
    Title,
    Author,
    Rating,
    Year,
}

impl SortKey for BookSort {
    fn descending_by_default(&self) -> bool {
        !matches!(self, BookSort::Title | BookSort::Author)
    }
}

impl Listable for Book {
    type Sort = BookSort;

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.title.as_str(),
            self.author.as_str(),
            self.subject.as_str(),
        ];
        fields.extend(self.description.as_deref());
        fields
    }

    fn facet(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "subject" => Some(Cow::Borrowed(self.subject.as_str())),
            "grade" => Some(Cow::Borrowed(self.grade.as_str())),
            "format" => self.format.as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }

    fn sort_value(&self, key: BookSort) -> SortValue<'_> {
        match key {
            BookSort::Newest => SortValue::Time(self.created_at),
            BookSort::Title => SortValue::Text(self.title.as_str()),
            BookSort::Author => SortValue::Text(self.author.as_str()),
            BookSort::Rating => SortValue::Number(self.rating),
            BookSort::Year => SortValue::Number(self.year.map(f64::from)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub sort: BookSort,
    pub order: Option<SortOrder>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

impl BookListQuery {
    pub fn to_list_query(&self) -> ListQuery<BookSort> {
        let defaults = PaginationQuery::default();
        ListQuery {
            search: self.search.clone(),
            facets: vec![
                Facet::new("subject", &self.subject),
                Facet::new("grade", &self.grade),
                Facet::new("format", &self.format),
            ],
            sort: self.sort,
            order: self.order,
            pagination: PaginationQuery {
                page: self.page.unwrap_or(defaults.page),
                per_page: self.per_page.unwrap_or(defaults.per_page),
            },
        }
    }
}
