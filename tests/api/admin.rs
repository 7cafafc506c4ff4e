use crate::helpers::{spawn_app, token_for, ADMIN_EMAIL, STUDENT_EMAIL};

#[tokio::test]
async fn admin_endpoints_require_a_token() {
    let app = spawn_app().await;

    for path in ["/admin/dashboard", "/admin/surveys", "/admin/usage", "/admin/analytics/surveys"] {
        let response = app.get_as(path, None).await;
        assert_eq!(401, response.status().as_u16(), "{} without a token", path);
    }
}

#[tokio::test]
async fn non_admins_are_forbidden() {
    let app = spawn_app().await;
    let student = token_for(STUDENT_EMAIL);

    for path in ["/admin/dashboard", "/admin/surveys", "/admin/usage", "/admin/analytics/surveys"] {
        let response = app.get_as(path, Some(&student)).await;
        assert_eq!(403, response.status().as_u16(), "{} as a student", path);
    }
}

#[tokio::test]
async fn tampered_tokens_are_unauthorized() {
    let app = spawn_app().await;
    let mut token = token_for(ADMIN_EMAIL);
    token.push('x');

    let response = app.get_as("/admin/dashboard", Some(&token)).await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn dashboard_counts_every_collection() {
    let app = spawn_app().await;

    let response = app
        .get_as("/admin/dashboard", Some(&token_for(ADMIN_EMAIL)))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["data"],
        serde_json::json!({ "papers": 0, "books": 0, "studyGuides": 0, "surveys": 0 })
    );
}

#[tokio::test]
async fn me_reports_admin_status() {
    let app = spawn_app().await;

    let admin: serde_json::Value = app
        .get_as("/auth/me", Some(&token_for(ADMIN_EMAIL)))
        .await
        .json()
        .await
        .unwrap();
    let student: serde_json::Value = app
        .get_as("/auth/me", Some(&token_for(STUDENT_EMAIL)))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(admin["data"]["isAdmin"], true);
    assert_eq!(student["data"]["isAdmin"], false);
    assert_eq!(student["data"]["email"], STUDENT_EMAIL);
}
