use std::sync::Arc;

use chrono::Utc;
use digital_library::core::config::GithubConfig;
use digital_library::core::{get_subscriber, init_subscriber, AppConfig};
use digital_library::db::library::LibraryStores;
use digital_library::db::memory::{MemoryStore, MemorySurveyStore, MemoryUsageStore};
use digital_library::library_web_server::LibraryWebServer;
use digital_library::models::books::Book;
use digital_library::models::papers::Paper;
use digital_library::models::study_guides::StudyGuide;
use jsonwebtoken::{encode, EncodingKey, Header};
use once_cell::sync::Lazy;
use secrecy::Secret;
use serde_json::json;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const ADMIN_EMAIL: &str = "admin@library.test";
pub const STUDENT_EMAIL: &str = "student@library.test";

// Ensure that the `tracing` stack is only initialised once
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub papers: Arc<MemoryStore<Paper>>,
    pub books: Arc<MemoryStore<Book>>,
    pub study_guides: Arc<MemoryStore<StudyGuide>>,
    pub surveys: Arc<MemorySurveyStore>,
    pub storage_server: mockito::ServerGuard,
    pub github_server: mockito::ServerGuard,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    pub async fn post_survey(&self, token: &str, body: serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(self.url("/surveys"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_as(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.api_client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }
}

/// A signed access token as the identity provider would issue it.
pub fn token_for(email: &str) -> String {
    let claims = json!({
        "sub": format!("user-{}", email),
        "email": email,
        "aud": "authenticated",
        "exp": Utc::now().timestamp() + 3600,
    });

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign token")
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let storage_server = mockito::Server::new_async().await;
    let github_server = mockito::Server::new_async().await;

    let configuration = {
        let mut c = AppConfig::new().expect("Failed to read configuration.");
        c.library_server_config.host = "127.0.0.1".to_string();
        c.library_server_config.port = 0;
        c.storage.base_url = storage_server.url();
        c.github = Some(GithubConfig {
            api_base_url: github_server.url(),
            repo: "acme/past-papers".to_string(),
            branch: "main".to_string(),
            token: Secret::new("gh-token".to_string()),
        });
        c.auth.jwt_secret = Secret::new(JWT_SECRET.to_string());
        c.auth.audience = Some("authenticated".to_string());
        c.auth.admin_emails = vec![ADMIN_EMAIL.to_string()];
        c.auth.admin_role = None;
        c
    };

    let papers = Arc::new(MemoryStore::<Paper>::default());
    let books = Arc::new(MemoryStore::<Book>::default());
    let study_guides = Arc::new(MemoryStore::<StudyGuide>::default());
    let surveys = Arc::new(MemorySurveyStore::default());

    let stores = LibraryStores {
        papers: papers.clone(),
        books: books.clone(),
        study_guides: study_guides.clone(),
        surveys: surveys.clone(),
        usage: Arc::new(MemoryUsageStore::default()),
    };

    let application = LibraryWebServer::build_with_stores(configuration, stores)
        .await
        .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", application.port());
    let _ = tokio::spawn(application.run_until_stopped());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        api_client,
        papers,
        books,
        study_guides,
        surveys,
        storage_server,
        github_server,
    }
}
