use reqwest::{header, Url};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use super::config::GithubConfig;
use super::{AppError, AppErrorType};

const USER_AGENT: &str = "digital-library-service";

#[derive(Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
}

#[derive(Deserialize)]
struct PutContentsResponse {
    content: Option<ContentEntry>,
}

#[derive(Deserialize)]
struct ContentEntry {
    download_url: Option<String>,
    html_url: Option<String>,
}

/// Writes files into a source-control repository through its contents API.
pub struct RepositoryClient {
    http: reqwest::Client,
    api_base_url: String,
    repo: String,
    branch: String,
    token: Secret<String>,
}

impl RepositoryClient {
    pub fn new(config: &GithubConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            repo: config.repo.trim().to_string(),
            branch: config.branch.clone(),
            token: config.token.clone(),
        }
    }

    fn contents_url(&self, path: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.api_base_url).map_err(AppError::config_error)?;
        url.path_segments_mut()
            .map_err(|_| AppError::config_error("github.api_base_url cannot be a base URL"))?
            .pop_if_empty()
            .push("repos")
            .extend(self.repo.split('/'))
            .push("contents")
            .extend(path.split('/'));
        Ok(url)
    }

    /// Create `path` with already base64-encoded content and return its raw
    /// download URL. Upstream failures keep their status and body.
    #[tracing::instrument(name = "Put repository file", skip(self, base64_content))]
    pub async fn put_file(
        &self,
        path: &str,
        base64_content: &str,
        message: &str,
    ) -> Result<String, AppError> {
        let response = self
            .http
            .put(self.contents_url(path)?)
            .header(header::AUTHORIZATION, format!("token {}", self.token.expose_secret()))
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::USER_AGENT, USER_AGENT)
            .json(&PutContentsBody {
                message,
                content: base64_content,
                branch: &self.branch,
            })
            .send()
            .await
            .map_err(|e| AppError {
                message: Some(format!("Failed to reach repository host: {}", e)),
                cause: Some(e.to_string()),
                error_type: AppErrorType::InternalServerError,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "repository host rejected upload");
            return Err(AppError {
                message: None,
                cause: Some(format!("repository host returned {}", status)),
                error_type: AppErrorType::ApiError {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let body: PutContentsResponse = response
            .json()
            .await
            .map_err(|e| AppError::internal_error(format!("Unexpected repository response: {}", e)))?;

        body.content
            .and_then(|content| content.download_url.or(content.html_url))
            .ok_or_else(|| AppError::internal_error("Repository response carried no download URL"))
    }
}
