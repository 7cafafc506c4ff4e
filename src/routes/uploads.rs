use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use std::collections::HashMap;
use std::path::Path;

use crate::{
    core::{utils::object_name, AppError, AppErrorType, StorageClient},
    models::{
        resource_usage::ResourceKind,
        uploads::{StoredObject, UploadedFile},
    },
};

pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024; // 50MB
const MAX_FIELD_SIZE: usize = 64 * 1024;

#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

fn read_error(what: &str, e: impl ToString) -> AppError {
    AppError {
        message: Some(format!("Failed to read {}", what)),
        cause: Some(e.to_string()),
        error_type: AppErrorType::PayloadValidationError,
    }
}

/// Drain a multipart body into text fields and in-memory files. Parts with a
/// filename are files, everything else is text.
pub async fn read_upload_form(mut payload: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {:?}", e);
        AppError {
            message: Some("Invalid file upload format".to_string()),
            cause: Some(e.to_string()),
            error_type: AppErrorType::PayloadValidationError,
        }
    })? {
        let disposition = field.content_disposition().clone();
        let name = disposition.get_name().unwrap_or("").to_string();
        let filename = disposition.get_filename().map(str::to_string);
        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let limit = if filename.is_some() {
            MAX_FILE_SIZE
        } else {
            MAX_FIELD_SIZE
        };

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|e| read_error(&name, e))? {
            data.extend_from_slice(&chunk);
            if data.len() > limit {
                return Err(AppError::validation(format!(
                    "`{}` exceeds the maximum size of {} bytes",
                    name, limit
                )));
            }
        }

        match filename {
            Some(filename) => {
                form.files.insert(
                    name,
                    UploadedFile {
                        filename,
                        content_type,
                        bytes: data,
                    },
                );
            }
            None => {
                let value = String::from_utf8(data).map_err(|e| AppError {
                    message: Some(format!("Invalid {} encoding", name)),
                    cause: Some(e.to_string()),
                    error_type: AppErrorType::PayloadValidationError,
                })?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

/// Upper-cased extension, used as the record's `format` when none was given.
pub fn format_from_file_name(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_uppercase())
}

pub async fn store_file(
    storage: &StorageClient,
    kind: ResourceKind,
    prefix: &str,
    file: UploadedFile,
) -> Result<StoredObject, AppError> {
    if file.bytes.is_empty() {
        return Err(AppError::validation("Uploaded file is empty"));
    }

    let bucket = storage.bucket_for(kind).to_string();
    let path = object_name(prefix, &file.filename);

    storage
        .upload(&bucket, &path, &file.content_type, file.bytes)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store {} upload: {:?}", kind, e);
            e
        })
}

/// Where a new record's file lives: an uploaded `file` part is stored first;
/// otherwise an explicit `downloadUrl` field (e.g. a file already pushed to
/// the repository host) is used as is.
pub async fn resolve_download_url(
    form: &mut UploadForm,
    storage: &StorageClient,
    kind: ResourceKind,
    prefix: &str,
) -> Result<(String, Option<String>), AppError> {
    if let Some(file) = form.take_file("file") {
        let format = format_from_file_name(&file.filename);
        let stored = store_file(storage, kind, prefix, file).await?;
        return Ok((stored.public_url, format));
    }

    match form.field("downloadUrl") {
        Some(url) => Ok((url.to_string(), None)),
        None => Err(AppError::validation("File is required")),
    }
}
