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
pub struct Paper {
    pub id: i64,
    pub title: String,
    pub grade: String,
    pub subject: String,
    pub province: String,
    pub exam_type: String,
    pub year: String,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub format: Option<String>,
    pub identifier: Option<String>,
    pub download_url: String,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperDraft {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Grade is required"))]
    pub grade: String,
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Province is required"))]
    pub province: String,
    #[validate(length(min = 1, message = "Exam type is required"))]
    pub exam_type: String,
    #[validate(length(min = 1, message = "Year is required"))]
    pub year: String,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub format: Option<String>,
    pub identifier: Option<String>,
    pub download_url: String,
}

impl PaperDraft {
    /// Build a draft from multipart text fields. The download URL is filled
    /// in once the file has been stored.
    pub fn from_form(fields: &HashMap<String, String>) -> Self {
        let text = |key: &str| fields.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
        let optional = |key: &str| {
            fields
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            title: text("title"),
            grade: text("grade"),
            subject: text("subject"),
            province: text("province"),
            exam_type: text("examType"),
            year: text("year"),
            description: optional("description"),
            publisher: optional("publisher"),
            format: optional("format"),
            identifier: optional("identifier"),
            download_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperUpdate {
    pub title: Option<String>,
    pub grade: Option<String>,
    pub subject: Option<String>,
    pub province: Option<String>,
    pub exam_type: Option<String>,
    pub year: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub format: Option<String>,
    pub identifier: Option<String>,
    pub download_url: Option<String>,
}

impl PaperUpdate {
    pub fn apply(self, current: &Paper) -> PaperDraft {
        PaperDraft {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            grade: self.grade.unwrap_or_else(|| current.grade.clone()),
            subject: self.subject.unwrap_or_else(|| current.subject.clone()),
            province: self.province.unwrap_or_else(|| current.province.clone()),
            exam_type: self.exam_type.unwrap_or_else(|| current.exam_type.clone()),
            year: self.year.unwrap_or_else(|| current.year.clone()),
            description: self.description.or_else(|| current.description.clone()),
            publisher: self.publisher.or_else(|| current.publisher.clone()),
            format: self.format.or_else(|| current.format.clone()),
            identifier: self.identifier.or_else(|| current.identifier.clone()),
            download_url: self
                .download_url
                .unwrap_or_else(|| current.download_url.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSort {
    #[default]
    Newest,
    Title,
    Year,
    Downloads,
}

impl SortKey for PaperSort {
    fn descending_by_default(&self) -> bool {
        !matches!(self, PaperSort::Title)
    }
}

impl Listable for Paper {
    type Sort = PaperSort;

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.subject.as_str()];
        fields.extend(self.description.as_deref());
        fields.extend(self.publisher.as_deref());
        fields
    }

    fn facet(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "grade" => Some(Cow::Borrowed(self.grade.as_str())),
            "subject" => Some(Cow::Borrowed(self.subject.as_str())),
            "province" => Some(Cow::Borrowed(self.province.as_str())),
            "examType" => Some(Cow::Borrowed(self.exam_type.as_str())),
            "year" => Some(Cow::Borrowed(self.year.as_str())),
            _ => None,
        }
    }

    fn sort_value(&self, key: PaperSort) -> SortValue<'_> {
        match key {
            PaperSort::Newest => SortValue::Time(self.created_at),
            PaperSort::Title => SortValue::Text(self.title.as_str()),
            PaperSort::Year => SortValue::Number(self.year.trim().parse().ok()),
            PaperSort::Downloads => SortValue::Number(Some(self.download_count as f64)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperListQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub exam_type: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub sort: PaperSort,
    pub order: Option<SortOrder>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

impl PaperListQuery {
    pub fn to_list_query(&self) -> ListQuery<PaperSort> {
        let defaults = PaginationQuery::default();
        ListQuery {
            search: self.search.clone(),
            facets: vec![
                Facet::new("grade", &self.grade),
                Facet::new("subject", &self.subject),
                Facet::new("province", &self.province),
                Facet::new("examType", &self.exam_type),
                Facet::new("year", &self.year),
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
