use digital_library::models::study_guides::{Difficulty, StudyGuideDraft};
use mockito::Matcher;
use reqwest::multipart::{Form, Part};

use crate::helpers::{spawn_app, token_for, ADMIN_EMAIL, STUDENT_EMAIL};

fn fractions_form() -> Form {
    Form::new()
        .text("title", "Fractions Made Simple")
        .text("subject", "Mathematics")
        .text("grade", "7")
        .text("topic", "Fractions")
        .text("difficulty", "Intermediate")
        .text("rating", "4.5")
        .text("lastUpdated", "2024-03-01")
        .text("tags", "fractions, ratios, Fractions, ")
        .part(
            "file",
            Part::bytes(b"%PDF-1.4".to_vec())
                .file_name("fractions.pdf")
                .mime_str("application/pdf")
                .unwrap(),
        )
}

fn draft(title: &str, subject: &str, difficulty: Difficulty) -> StudyGuideDraft {
    StudyGuideDraft {
        title: title.to_string(),
        subject: subject.to_string(),
        grade: "9".to_string(),
        topic: "Revision".to_string(),
        description: None,
        author: None,
        difficulty,
        estimated_time: None,
        download_url: format!("https://files.test/{}.pdf", title),
        preview_url: None,
        rating: None,
        pages: None,
        format: None,
        last_updated: None,
        tags: Vec::new(),
    }
}

#[tokio::test]
async fn admin_upload_stores_the_file_and_parses_the_form() {
    let mut app = spawn_app().await;
    let storage = app
        .storage_server
        .mock(
            "POST",
            Matcher::Regex(r"^/storage/v1/object/study-guides/guides/.+\.pdf$".to_string()),
        )
        .match_header("content-type", "application/pdf")
        .with_status(200)
        .with_body(r#"{"Key":"study-guides/guides/x.pdf"}"#)
        .create_async()
        .await;

    let response = app
        .api_client
        .post(app.url("/study-guides"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .multipart(fractions_form())
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(201, response.status().as_u16());
    storage.assert_async().await;

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["difficulty"], "Intermediate");
    assert_eq!(body["data"]["rating"], 4.5);
    assert_eq!(body["data"]["lastUpdated"], "2024-03-01");
    assert_eq!(body["data"]["tags"], serde_json::json!(["fractions", "ratios"]));
    assert_eq!(body["data"]["format"], "PDF");
    assert_eq!(body["data"]["downloads"], 0);
}

#[tokio::test]
async fn unknown_difficulty_is_rejected_before_storage() {
    let mut app = spawn_app().await;
    let storage = app
        .storage_server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let form = fractions_form().text("difficulty", "Expert");
    let response = app
        .api_client
        .post(app.url("/study-guides"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    storage.assert_async().await;
    assert_eq!(0, app.study_guides.fetch_count());
}

#[tokio::test]
async fn students_cannot_upload_study_guides() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(app.url("/study-guides"))
        .bearer_auth(token_for(STUDENT_EMAIL))
        .multipart(fractions_form())
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn listing_filters_by_difficulty() {
    let app = spawn_app().await;
    app.study_guides.seed(1, &draft("Cells", "Biology", Difficulty::Beginner));
    app.study_guides.seed(2, &draft("Genetics", "Biology", Difficulty::Advanced));

    let body: serde_json::Value = app
        .get_as("/study-guides?difficulty=Advanced", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["pagination"]["totalItems"], 1);
    assert_eq!(body["data"][0]["title"], "Genetics");

    let empty: serde_json::Value = app
        .get_as("/study-guides?subject=History", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(empty["data"].as_array().unwrap().len(), 0);
    assert_eq!(empty["message"], "No study guides match the current filters");
}

#[tokio::test]
async fn download_redirects_and_update_keeps_the_counter() {
    let app = spawn_app().await;
    app.study_guides.seed(5, &draft("Cells", "Biology", Difficulty::Beginner));

    let response = app
        .get_as("/study-guides/5/download", Some(&token_for(STUDENT_EMAIL)))
        .await;
    assert_eq!(302, response.status().as_u16());
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "https://files.test/Cells.pdf"
    );

    let response = app
        .api_client
        .put(app.url("/study-guides/5"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .json(&serde_json::json!({ "title": "Cell Structure", "difficulty": "Intermediate" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Cell Structure");
    assert_eq!(body["data"]["difficulty"], "Intermediate");
    assert_eq!(body["data"]["subject"], "Biology");
    assert_eq!(body["data"]["downloads"], 1);
}

#[tokio::test]
async fn deleted_study_guides_are_gone() {
    let app = spawn_app().await;
    app.study_guides.seed(8, &draft("Cells", "Biology", Difficulty::Beginner));

    let student = app
        .api_client
        .delete(app.url("/study-guides/8"))
        .bearer_auth(token_for(STUDENT_EMAIL))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, student.status().as_u16());

    let response = app
        .api_client
        .delete(app.url("/study-guides/8"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    assert_eq!(404, app.get_as("/study-guides/8", None).await.status().as_u16());
}
