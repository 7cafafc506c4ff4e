use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

pub const NO_SUBJECT_MESSAGE: &str = "Please select at least one subject";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyFrequency {
    Daily,
    Weekly,
    Monthly,
    Rarely,
}

#[derive(Debug, thiserror::Error)]
#[error("`{0}` is not a study frequency. Use daily, weekly, monthly or rarely")]
pub struct UnknownFrequency(String);

impl StudyFrequency {
    pub const ALL: [StudyFrequency; 4] = [
        StudyFrequency::Daily,
        StudyFrequency::Weekly,
        StudyFrequency::Monthly,
        StudyFrequency::Rarely,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudyFrequency::Daily => "daily",
            StudyFrequency::Weekly => "weekly",
            StudyFrequency::Monthly => "monthly",
            StudyFrequency::Rarely => "rarely",
        }
    }
}

impl fmt::Display for StudyFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels arrive as "Daily", " weekly ", "MONTHLY" and so on.
impl FromStr for StudyFrequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(StudyFrequency::Daily),
            "weekly" => Ok(StudyFrequency::Weekly),
            "monthly" => Ok(StudyFrequency::Monthly),
            "rarely" => Ok(StudyFrequency::Rarely),
            _ => Err(UnknownFrequency(s.to_string())),
        }
    }
}

impl TryFrom<String> for StudyFrequency {
    type Error = UnknownFrequency;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: i64,
    pub student_email: String,
    pub subjects: Vec<String>,
    #[sqlx(try_from = "String")]
    pub study_frequency: StudyFrequency,
    pub preferred_resources: Vec<String>,
    pub additional_comments: Option<String>,
    pub grade: Option<String>,
    pub province: Option<String>,
    pub satisfaction: Option<i16>,
    pub would_recommend: Option<bool>,
    pub timestamp: DateTime<Utc>,
}

fn validate_frequency(value: &str) -> Result<(), validator::ValidationError> {
    value.parse::<StudyFrequency>().map(|_| ()).map_err(|_| {
        let mut error = validator::ValidationError::new("study_frequency");
        error.message = Some("Please choose how often you study".into());
        error
    })
}

/// What a student sends when the feedback form is shown at logout.
#[derive(Debug, Clone, Default, Validate, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySubmission {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please select at least one subject"))]
    pub subjects: Vec<String>,
    #[serde(default)]
    #[validate(custom = "validate_frequency")]
    pub study_frequency: String,
    #[serde(default)]
    pub preferred_resources: Vec<String>,
    pub additional_comments: Option<String>,
    pub grade: Option<String>,
    pub province: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Satisfaction must be between 1 and 5"))]
    pub satisfaction: Option<i16>,
    pub would_recommend: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurveyDraft {
    pub student_email: String,
    pub subjects: Vec<String>,
    pub study_frequency: StudyFrequency,
    pub preferred_resources: Vec<String>,
    pub additional_comments: Option<String>,
    pub grade: Option<String>,
    pub province: Option<String>,
    pub satisfaction: Option<i16>,
    pub would_recommend: Option<bool>,
}

fn clean_set(values: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for value in values.into_iter().map(|v| v.trim().to_string()) {
        if !value.is_empty() && !cleaned.contains(&value) {
            cleaned.push(value);
        }
    }
    cleaned
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl SurveySubmission {
    /// Validate and attach the verified student email. Blank entries in the
    /// subject/resource sets do not count as a selection.
    pub fn into_draft(mut self, student_email: &str) -> Result<SurveyDraft, validator::ValidationErrors> {
        self.subjects = clean_set(self.subjects);
        self.preferred_resources = clean_set(self.preferred_resources);
        self.validate()?;

        // validate() above guarantees the frequency parses
        let study_frequency = self
            .study_frequency
            .parse()
            .unwrap_or(StudyFrequency::Rarely);

        Ok(SurveyDraft {
            student_email: student_email.to_string(),
            subjects: self.subjects,
            study_frequency,
            preferred_resources: self.preferred_resources,
            additional_comments: non_blank(self.additional_comments),
            grade: non_blank(self.grade),
            province: non_blank(self.province),
            satisfaction: self.satisfaction,
            would_recommend: self.would_recommend,
        })
    }
}
