use serde::{Deserialize, Deserializer, Serialize};

/// A file read out of a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub public_url: String,
}

/// Accepts `"10"` as well as `10`; form libraries send either.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text.trim().to_string(),
        Raw::Number(number) => number.to_string(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryUploadMetadata {
    #[serde(default, deserialize_with = "string_or_number")]
    pub grade: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(default)]
    pub exam_type: String,
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryUploadRequest {
    pub metadata: Option<RepositoryUploadMetadata>,
    pub base64_content: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryUploadResponse {
    pub success: bool,
    pub download_url: String,
}
