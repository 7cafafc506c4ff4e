use serde_json::json;

use crate::helpers::{spawn_app, token_for, ADMIN_EMAIL, STUDENT_EMAIL};

#[tokio::test]
async fn survey_without_a_subject_is_rejected_and_not_stored() {
    let app = spawn_app().await;

    let response = app
        .post_survey(
            &token_for(STUDENT_EMAIL),
            json!({
                "subjects": [],
                "studyFrequency": "Daily",
                "preferredResources": ["Past Papers"]
            }),
        )
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Please select at least one subject");
    assert_eq!(0, app.surveys.insert_count());
}

#[tokio::test]
async fn survey_is_stored_under_the_token_email() {
    let app = spawn_app().await;

    let response = app
        .post_survey(
            &token_for(STUDENT_EMAIL),
            json!({
                "studentEmail": "someone-else@library.test",
                "subjects": ["Mathematics", " Mathematics ", "Physics"],
                "studyFrequency": " weekly ",
                "preferredResources": ["Study Guides"],
                "satisfaction": 4,
                "wouldRecommend": true
            }),
        )
        .await;

    assert_eq!(201, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["studentEmail"], STUDENT_EMAIL);
    assert_eq!(body["data"]["subjects"], json!(["Mathematics", "Physics"]));
    assert_eq!(body["data"]["studyFrequency"], "weekly");
    assert_eq!(1, app.surveys.insert_count());
}

#[tokio::test]
async fn anonymous_surveys_are_rejected() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(app.url("/surveys"))
        .json(&json!({ "subjects": ["Mathematics"], "studyFrequency": "daily" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    assert_eq!(0, app.surveys.insert_count());
}

#[tokio::test]
async fn analytics_count_normalized_frequencies() {
    let app = spawn_app().await;
    let student = token_for(STUDENT_EMAIL);

    for frequency in ["Daily", "Rarely"] {
        let response = app
            .post_survey(
                &student,
                json!({ "subjects": ["Mathematics"], "studyFrequency": frequency }),
            )
            .await;
        assert_eq!(201, response.status().as_u16());
    }

    let response = app
        .get_as("/admin/analytics/surveys", Some(&token_for(ADMIN_EMAIL)))
        .await;
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();
    let analytics = &body["data"];
    assert_eq!(analytics["totalResponses"], 2);
    assert_eq!(analytics["studyFrequency"]["daily"], 1);
    assert_eq!(analytics["studyFrequency"]["rarely"], 1);
    assert_eq!(analytics["studyFrequency"]["weekly"], 0);
    assert_eq!(analytics["subjects"]["Mathematics"], 2);
}
