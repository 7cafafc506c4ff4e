use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::listing::{Facet, ListQuery, Listable, SortKey, SortOrder, SortValue};
use super::pagination::PaginationQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, thiserror::Error)]
#[error("`{0}` is not a difficulty level. Use Beginner, Intermediate or Advanced")]
pub struct UnknownDifficulty(String);

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(UnknownDifficulty(s.to_string())),
        }
    }
}

impl TryFrom<String> for Difficulty {
    type Error = UnknownDifficulty;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGuide {
    pub id: i64,
    pub title: String,
    pub subject: String,
    pub grade: String,
    pub topic: String,
    pub description: Option<String>,
    pub author: Option<String>,
    #[sqlx(try_from = "String")]
    pub difficulty: Difficulty,
    pub estimated_time: Option<String>,
    pub download_url: String,
    pub preview_url: Option<String>,
    pub rating: Option<f64>,
    pub downloads: i64,
    pub pages: Option<i32>,
    pub format: Option<String>,
    pub last_updated: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGuideDraft {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Grade is required"))]
    pub grade: String,
    #[validate(length(min = 1, message = "Topic is required"))]
    pub topic: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub difficulty: Difficulty,
    pub estimated_time: Option<String>,
    pub download_url: String,
    pub preview_url: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
    #[validate(range(min = 1, message = "Pages must be positive"))]
    pub pages: Option<i32>,
    pub format: Option<String>,
    pub last_updated: Option<NaiveDate>,
    pub tags: Vec<String>,
}

/// Split a comma separated tag field, dropping blanks and duplicates while
/// keeping first-seen order.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag.to_string());
        }
    }
    tags
}

impl StudyGuideDraft {
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, String> {
        let text = |key: &str| fields.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
        let optional = |key: &str| {
            fields
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let difficulty = match optional("difficulty") {
            Some(value) => value.parse().map_err(|e: UnknownDifficulty| e.to_string())?,
            None => Difficulty::Beginner,
        };

        let rating = optional("rating")
            .map(|v| v.parse::<f64>().map_err(|_| "rating must be a number".to_string()))
            .transpose()?;
        let pages = optional("pages")
            .map(|v| v.parse::<i32>().map_err(|_| "pages must be a number".to_string()))
            .transpose()?;
        let last_updated = optional("lastUpdated")
            .map(|v| {
                NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                    .map_err(|_| "lastUpdated must be a YYYY-MM-DD date".to_string())
            })
            .transpose()?;

        Ok(Self {
            title: text("title"),
            subject: text("subject"),
            grade: text("grade"),
            topic: text("topic"),
            description: optional("description"),
            author: optional("author"),
            difficulty,
            estimated_time: optional("estimatedTime"),
            download_url: String::new(),
            preview_url: optional("previewUrl"),
            rating,
            pages,
            format: optional("format"),
            last_updated,
            tags: parse_tags(&text("tags")),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGuideUpdate {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub grade: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub estimated_time: Option<String>,
    pub download_url: Option<String>,
    pub preview_url: Option<String>,
    pub rating: Option<f64>,
    pub pages: Option<i32>,
    pub format: Option<String>,
    pub last_updated: Option<NaiveDate>,
    pub tags: Option<Vec<String>>,
}

impl StudyGuideUpdate {
    pub fn apply(self, current: &StudyGuide) -> StudyGuideDraft {
        StudyGuideDraft {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            subject: self.subject.unwrap_or_else(|| current.subject.clone()),
            grade: self.grade.unwrap_or_else(|| current.grade.clone()),
            topic: self.topic.unwrap_or_else(|| current.topic.clone()),
            description: self.description.or_else(|| current.description.clone()),
            author: self.author.or_else(|| current.author.clone()),
            difficulty: self.difficulty.unwrap_or(current.difficulty),
            estimated_time: self.estimated_time.or_else(|| current.estimated_time.clone()),
            download_url: self
                .download_url
                .unwrap_or_else(|| current.download_url.clone()),
            preview_url: self.preview_url.or_else(|| current.preview_url.clone()),
            rating: self.rating.or(current.rating),
            pages: self.pages.or(current.pages),
            format: self.format.or_else(|| current.format.clone()),
            last_updated: self.last_updated.or(current.last_updated),
            tags: self.tags.unwrap_or_else(|| current.tags.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyGuideSort {
    #[default]
    Newest,
    Title,
    Rating,
    Downloads,
}

impl SortKey for StudyGuideSort {
    fn descending_by_default(&self) -> bool {
        !matches!(self, StudyGuideSort::Title)
    }
}

impl Listable for StudyGuide {
    type Sort = StudyGuideSort;

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.title.as_str(),
            self.topic.as_str(),
            self.subject.as_str(),
        ];
        fields.extend(self.description.as_deref());
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn facet(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "subject" => Some(Cow::Borrowed(self.subject.as_str())),
            "grade" => Some(Cow::Borrowed(self.grade.as_str())),
            "difficulty" => Some(Cow::Borrowed(self.difficulty.as_str())),
            _ => None,
        }
    }

    fn sort_value(&self, key: StudyGuideSort) -> SortValue<'_> {
        match key {
            StudyGuideSort::Newest => SortValue::Time(self.created_at),
            StudyGuideSort::Title => SortValue::Text(self.title.as_str()),
            StudyGuideSort::Rating => SortValue::Number(self.rating),
            StudyGuideSort::Downloads => SortValue::Number(Some(self.downloads as f64)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGuideListQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub sort: StudyGuideSort,
    pub order: Option<SortOrder>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

impl StudyGuideListQuery {
    pub fn to_list_query(&self) -> ListQuery<StudyGuideSort> {
        let defaults = PaginationQuery::default();
        ListQuery {
            search: self.search.clone(),
            facets: vec![
                Facet::new("subject", &self.subject),
                Facet::new("grade", &self.grade),
                Facet::new("difficulty", &self.difficulty),
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
