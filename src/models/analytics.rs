use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::surveys::{StudyFrequency, Survey};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnalytics {
    pub total_responses: usize,
    pub study_frequency: BTreeMap<String, usize>,
    pub subjects: BTreeMap<String, usize>,
    pub preferred_resources: BTreeMap<String, usize>,
    pub average_satisfaction: Option<f64>,
    pub would_recommend: usize,
    pub responses_by_day: BTreeMap<NaiveDate, usize>,
}

impl SurveyAnalytics {
    pub fn from_surveys(surveys: &[Survey]) -> Self {
        let mut study_frequency: BTreeMap<String, usize> = StudyFrequency::ALL
            .iter()
            .map(|f| (f.as_str().to_string(), 0))
            .collect();
        let mut subjects = BTreeMap::new();
        let mut preferred_resources = BTreeMap::new();
        let mut responses_by_day = BTreeMap::new();
        let mut satisfaction_total = 0i64;
        let mut satisfaction_count = 0i64;
        let mut would_recommend = 0;

        for survey in surveys {
            *study_frequency
                .entry(survey.study_frequency.as_str().to_string())
                .or_insert(0) += 1;

            for subject in &survey.subjects {
                *subjects.entry(subject.clone()).or_insert(0) += 1;
            }
            for resource in &survey.preferred_resources {
                *preferred_resources.entry(resource.clone()).or_insert(0) += 1;
            }

            if let Some(score) = survey.satisfaction {
                satisfaction_total += i64::from(score);
                satisfaction_count += 1;
            }
            if survey.would_recommend == Some(true) {
                would_recommend += 1;
            }

            *responses_by_day
                .entry(survey.timestamp.date_naive())
                .or_insert(0) += 1;
        }

        let average_satisfaction = (satisfaction_count > 0)
            .then(|| satisfaction_total as f64 / satisfaction_count as f64);

        Self {
            total_responses: surveys.len(),
            study_frequency,
            subjects,
            preferred_resources,
            average_satisfaction,
            would_recommend,
            responses_by_day,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub papers: usize,
    pub books: usize,
    pub study_guides: usize,
    pub surveys: usize,
}
