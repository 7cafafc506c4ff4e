use digital_library::models::books::BookDraft;
use mockito::Matcher;
use reqwest::multipart::{Form, Part};

use crate::helpers::{spawn_app, token_for, ADMIN_EMAIL, STUDENT_EMAIL};

fn book_draft(title: &str) -> BookDraft {
    BookDraft {
        title: title.to_string(),
        author: "A. Author".to_string(),
        subject: "Biology".to_string(),
        grade: "11".to_string(),
        download_url: "https://files.test/biology.pdf".to_string(),
        ..Default::default()
    }
}

fn biology_form(cover: Part) -> Form {
    Form::new()
        .text("title", "Life Sciences")
        .text("author", "A. Author")
        .text("subject", "Biology")
        .text("grade", "11")
        .part(
            "file",
            Part::bytes(b"%PDF-1.4".to_vec())
                .file_name("biology.pdf")
                .mime_str("application/pdf")
                .unwrap(),
        )
        .part("cover", cover)
}

#[tokio::test]
async fn empty_cover_is_rejected_before_anything_is_stored() {
    let mut app = spawn_app().await;
    let storage = app
        .storage_server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let cover = Part::bytes(Vec::new()).file_name("cover.png");
    let response = app
        .api_client
        .post(app.url("/books"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .multipart(biology_form(cover))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Cover image is empty");
    storage.assert_async().await;
}

#[tokio::test]
async fn failed_cover_upload_does_not_create_the_book() {
    let mut app = spawn_app().await;
    let file = app
        .storage_server
        .mock(
            "POST",
            Matcher::Regex(r"^/storage/v1/object/books/books/.+\.pdf$".to_string()),
        )
        .with_status(200)
        .with_body(r#"{"Key":"books/books/x.pdf"}"#)
        .create_async()
        .await;
    let cover_upload = app
        .storage_server
        .mock(
            "POST",
            Matcher::Regex(r"^/storage/v1/object/books/covers/.+\.png$".to_string()),
        )
        .with_status(500)
        .with_body("storage unavailable")
        .create_async()
        .await;

    let cover = Part::bytes(vec![0x89, b'P', b'N', b'G'])
        .file_name("cover.png")
        .mime_str("image/png")
        .unwrap();
    let response = app
        .api_client
        .post(app.url("/books"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .multipart(biology_form(cover))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(!response.status().is_success());
    file.assert_async().await;
    cover_upload.assert_async().await;

    let listed: serde_json::Value = app.get_as("/books", None).await.json().await.unwrap();
    assert_eq!(listed["pagination"]["totalItems"], 0);
}

#[tokio::test]
async fn admin_can_delete_a_book() {
    let app = spawn_app().await;
    app.books.seed(42, &book_draft("Life Sciences"));
    let admin = token_for(ADMIN_EMAIL);

    // warm the cache so the delete has something to invalidate
    let listed: serde_json::Value = app.get_as("/books", None).await.json().await.unwrap();
    assert_eq!(listed["pagination"]["totalItems"], 1);

    let response = app
        .api_client
        .delete(app.url("/books/42"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    assert_eq!(404, app.get_as("/books/42", None).await.status().as_u16());

    let listed: serde_json::Value = app.get_as("/books", None).await.json().await.unwrap();
    assert_eq!(listed["pagination"]["totalItems"], 0);

    let again = app
        .api_client
        .delete(app.url("/books/42"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, again.status().as_u16());
}

#[tokio::test]
async fn students_cannot_delete_books() {
    let app = spawn_app().await;
    app.books.seed(42, &book_draft("Life Sciences"));

    let response = app
        .api_client
        .delete(app.url("/books/42"))
        .bearer_auth(token_for(STUDENT_EMAIL))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(403, response.status().as_u16());
    assert_eq!(200, app.get_as("/books/42", None).await.status().as_u16());
}

#[tokio::test]
async fn update_merges_over_the_current_book() {
    let app = spawn_app().await;
    app.books.seed(3, &book_draft("Life Sciences"));

    let response = app
        .api_client
        .put(app.url("/books/3"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .json(&serde_json::json!({ "rating": 4.5 }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Life Sciences");
    assert_eq!(body["data"]["rating"], 4.5);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let app = spawn_app().await;
    app.books.seed(3, &book_draft("Life Sciences"));

    let response = app
        .api_client
        .put(app.url("/books/3"))
        .bearer_auth(token_for(ADMIN_EMAIL))
        .json(&serde_json::json!({ "rating": 9.0 }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Rating must be between 0 and 5");
}
