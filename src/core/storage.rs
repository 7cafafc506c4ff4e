use reqwest::{header, Url};
use secrecy::{ExposeSecret, Secret};

use super::config::StorageConfig;
use super::AppError;
use crate::models::resource_usage::ResourceKind;
use crate::models::uploads::StoredObject;

/// Client for the hosted object store's REST API.
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    service_key: Secret<String>,
    papers_bucket: String,
    books_bucket: String,
    study_guides_bucket: String,
}

impl StorageClient {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            papers_bucket: config.papers_bucket.clone(),
            books_bucket: config.books_bucket.clone(),
            study_guides_bucket: config.study_guides_bucket.clone(),
        }
    }

    pub fn bucket_for(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Paper => &self.papers_bucket,
            ResourceKind::Book => &self.books_bucket,
            ResourceKind::StudyGuide => &self.study_guides_bucket,
        }
    }

    fn object_url(&self, segments: &[&str], path: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url).map_err(AppError::config_error)?;
        url.path_segments_mut()
            .map_err(|_| AppError::config_error("storage.base_url cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments)
            .extend(path.split('/'));
        Ok(url)
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> Result<String, AppError> {
        self.object_url(&["storage", "v1", "object", "public", bucket], path)
            .map(String::from)
    }

    #[tracing::instrument(name = "Upload object", skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, AppError> {
        let url = self.object_url(&["storage", "v1", "object", bucket], path)?;
        let key = self.service_key.expose_secret();

        let response = self
            .http
            .post(url)
            .bearer_auth(key)
            .header("apikey", key.as_str())
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "object storage rejected upload");
            return Err(AppError {
                message: Some(format!("Failed to store file: {}", body)),
                cause: Some(format!("storage returned {}", status)),
                error_type: super::AppErrorType::StorageError,
            });
        }

        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            public_url: self.public_url(bucket, path)?,
        })
    }
}
