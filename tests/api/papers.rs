use digital_library::models::papers::PaperDraft;
use mockito::Matcher;
use reqwest::multipart::{Form, Part};

use crate::helpers::{spawn_app, token_for, ADMIN_EMAIL, STUDENT_EMAIL};

fn algebra_form() -> Form {
    Form::new()
        .text("title", "Algebra Test")
        .text("grade", "10")
        .text("subject", "Mathematics")
        .text("province", "Gauteng")
        .text("examType", "Final")
        .text("year", "2024")
        .part(
            "file",
            Part::bytes(b"%PDF-1.4".to_vec())
                .file_name("algebra.pdf")
                .mime_str("application/pdf")
                .unwrap(),
        )
}

fn draft(title: &str, subject: &str, year: &str) -> PaperDraft {
    PaperDraft {
        title: title.to_string(),
        grade: "12".to_string(),
        subject: subject.to_string(),
        province: "Western Cape".to_string(),
        exam_type: "Final".to_string(),
        year: year.to_string(),
        download_url: format!("https://files.test/{}.pdf", title),
        ..Default::default()
    }
}

#[tokio::test]
async fn admin_upload_stores_the_file_and_lists_the_paper() {
    let mut app = spawn_app().await;
    let storage = app
        .storage_server
        .mock(
            "POST",
            Matcher::Regex(r"^/storage/v1/object/papers/papers/.+\.pdf$".to_string()),
        )
        .match_header("content-type", "application/pdf")
        .with_status(200)
        .with_body(r#"{"Key":"papers/papers/x.pdf"}"#)
        .create_async()
        .await;

    let response = app
        .api_client
        .post(app.url("/papers"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .multipart(algebra_form())
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(201, response.status().as_u16());
    storage.assert_async().await;

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Algebra Test");
    assert_eq!(body["data"]["format"], "PDF");
    let download_url = body["data"]["downloadUrl"].as_str().unwrap();
    assert!(download_url.starts_with(&format!(
        "{}/storage/v1/object/public/papers/papers/",
        app.storage_server.url()
    )));

    let listed: serde_json::Value = app
        .get_as("/papers?subject=Mathematics", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed["pagination"]["totalItems"], 1);
    assert_eq!(listed["data"][0]["title"], "Algebra Test");
}

#[tokio::test]
async fn upload_with_a_missing_title_is_rejected_before_storage() {
    let mut app = spawn_app().await;
    let storage = app
        .storage_server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let form = algebra_form().text("title", "");
    let response = app
        .api_client
        .post(app.url("/papers"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    storage.assert_async().await;
    assert_eq!(0, app.papers.fetch_count());
}

#[tokio::test]
async fn students_cannot_upload_papers() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(app.url("/papers"))
        .bearer_auth(token_for(STUDENT_EMAIL))
        .multipart(algebra_form())
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(403, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn filters_with_no_match_return_an_empty_page() {
    let app = spawn_app().await;
    app.papers.seed(1, &draft("Calculus", "Mathematics", "2023"));
    app.papers.seed(2, &draft("Mechanics", "Physics", "2022"));

    let response = app.get_as("/papers?subject=Chemistry", None).await;
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["pagination"]["totalItems"], 0);
    assert_eq!(body["message"], "No papers match the current filters");
}

#[tokio::test]
async fn repeated_listings_are_served_from_the_cache() {
    let app = spawn_app().await;
    app.papers.seed(1, &draft("Calculus", "Mathematics", "2023"));

    app.get_as("/papers", None).await;
    app.get_as("/papers?search=calc", None).await;
    assert_eq!(1, app.papers.fetch_count());

    app.get_as("/papers?refresh=true", None).await;
    assert_eq!(2, app.papers.fetch_count());
}

#[tokio::test]
async fn download_redirects_and_is_counted() {
    let app = spawn_app().await;
    app.papers.seed(7, &draft("Calculus", "Mathematics", "2023"));

    let response = app
        .get_as("/papers/7/download", Some(&token_for(STUDENT_EMAIL)))
        .await;
    assert_eq!(302, response.status().as_u16());
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "https://files.test/Calculus.pdf"
    );

    let paper: serde_json::Value = app.get_as("/papers/7", None).await.json().await.unwrap();
    assert_eq!(paper["data"]["downloadCount"], 1);

    let usage: serde_json::Value = app
        .get_as("/admin/usage", Some(&token_for(ADMIN_EMAIL)))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(usage["data"][0]["resourceType"], "paper");
    assert_eq!(usage["data"][0]["downloads"], 1);
}

#[tokio::test]
async fn unknown_paper_is_a_404() {
    let app = spawn_app().await;

    let response = app.get_as("/papers/999", None).await;

    assert_eq!(404, response.status().as_u16());
}
