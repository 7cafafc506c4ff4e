use mockito::Matcher;
use serde_json::json;

use crate::helpers::{spawn_app, token_for, ADMIN_EMAIL, STUDENT_EMAIL};

fn upload_body() -> serde_json::Value {
    json!({
        "metadata": {
            "grade": 10,
            "subject": "Mathematics",
            "year": 2024,
            "examType": "Final",
            "title": "Algebra Test"
        },
        "base64Content": "JVBERi0xLjQ=",
        "fileName": "algebra.pdf"
    })
}

#[tokio::test]
async fn upload_is_pushed_to_the_repository() {
    let mut app = spawn_app().await;
    let github = app
        .github_server
        .mock(
            "PUT",
            "/repos/acme/past-papers/contents/papers/grade-10/Mathematics/2024/Final/algebra.pdf",
        )
        .match_header("authorization", "token gh-token")
        .match_body(Matcher::PartialJson(json!({
            "content": "JVBERi0xLjQ=",
            "branch": "main"
        })))
        .with_status(201)
        .with_body(r#"{"content":{"download_url":"https://raw.test/algebra.pdf"}}"#)
        .create_async()
        .await;

    let response = app
        .api_client
        .post(app.url("/github/upload"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .json(&upload_body())
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    github.assert_async().await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": true, "downloadUrl": "https://raw.test/algebra.pdf" })
    );
}

#[tokio::test]
async fn repository_errors_are_relayed() {
    let mut app = spawn_app().await;
    app.github_server
        .mock("PUT", Matcher::Any)
        .with_status(422)
        .with_body(r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#)
        .create_async()
        .await;

    let response = app
        .api_client
        .post(app.url("/github/upload"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .json(&upload_body())
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(422, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid request.\n\n\"sha\" wasn't supplied.");
}

#[tokio::test]
async fn incomplete_requests_are_rejected() {
    let mut app = spawn_app().await;
    let github = app
        .github_server
        .mock("PUT", Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let admin = token_for(ADMIN_EMAIL);

    let mut missing_content = upload_body();
    missing_content["base64Content"] = json!(null);
    let mut bad_base64 = upload_body();
    bad_base64["base64Content"] = json!("not base64!!");
    let mut missing_subject = upload_body();
    missing_subject["metadata"]["subject"] = json!("");

    for (body, case) in [
        (missing_content, "missing content"),
        (bad_base64, "invalid base64"),
        (missing_subject, "missing subject"),
    ] {
        let response = app
            .api_client
            .post(app.url("/github/upload"))
            .bearer_auth(&admin)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(400, response.status().as_u16(), "{}", case);
    }

    github.assert_async().await;
}

#[tokio::test]
async fn students_cannot_push_to_the_repository() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(app.url("/github/upload"))
        .bearer_auth(token_for(STUDENT_EMAIL))
        .json(&upload_body())
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(403, response.status().as_u16());
}
