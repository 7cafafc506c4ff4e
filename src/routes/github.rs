use actix_web::{post, web, HttpResponse, Responder};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::instrument;

use crate::{
    core::{jwt_auth::AdminUser, utils::repository_path, AppError, RepositoryClient},
    models::uploads::{RepositoryUploadRequest, RepositoryUploadResponse},
};

/// Push an exam paper into the configured repository and return its raw URL.
#[instrument(name = "Repository Upload", skip(repository, body))]
#[post("/upload")]
pub async fn upload_to_repository(
    repository: Option<web::Data<RepositoryClient>>,
    admin: AdminUser,
    body: web::Json<RepositoryUploadRequest>,
) -> Result<impl Responder, AppError> {
    let RepositoryUploadRequest {
        metadata,
        base64_content,
        file_name,
    } = body.into_inner();

    let metadata = metadata.ok_or_else(|| AppError::validation("metadata is required"))?;
    let content = base64_content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::validation("base64Content is required"))?;
    let file_name = file_name
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| AppError::validation("fileName is required"))?;

    for (name, value) in [
        ("grade", &metadata.grade),
        ("subject", &metadata.subject),
        ("year", &metadata.year),
        ("examType", &metadata.exam_type),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::validation(format!("metadata.{} is required", name)));
        }
    }

    let content = content.trim();
    if STANDARD.decode(content).is_err() {
        return Err(AppError::validation("base64Content is not valid base64"));
    }

    let repository = repository
        .ok_or_else(|| AppError::config_error("GitHub integration is not configured"))?;

    let path = repository_path(&metadata, &file_name);
    let message = format!(
        "Add {}",
        metadata.title.as_deref().unwrap_or(file_name.as_str())
    );

    let download_url = repository.put_file(&path, content, &message).await?;

    tracing::info!(%path, admin = %admin.0.email, "file pushed to repository");

    Ok(HttpResponse::Ok().json(RepositoryUploadResponse {
        success: true,
        download_url,
    }))
}
