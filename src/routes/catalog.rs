use actix_web::{http::header, HttpResponse};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    core::{jwt_auth::AuthenticatedUser, AppError},
    db::{CachedRepository, Record, UsageStore},
    models::resource_usage::UsageEvent,
};

pub async fn list_or_refresh<R: Record>(
    repository: &CachedRepository<R>,
    refresh: bool,
) -> Result<Arc<Vec<R>>, AppError> {
    let result = if refresh {
        repository.refresh().await
    } else {
        repository.list().await
    };

    result.map_err(|e| {
        tracing::error!("Failed to fetch {} list: {:?}", R::KIND, e);
        e
    })
}

pub async fn find_or_404<R: Record>(repository: &CachedRepository<R>, id: i64) -> Result<R, AppError> {
    repository
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No {} with id {}", R::KIND, id)))
}

/// Log the download, bump the counter and redirect to the stored file.
/// Bookkeeping failures are logged and never block the download itself.
pub async fn serve_download<R: Record>(
    repository: &CachedRepository<R>,
    usage: &dyn UsageStore,
    id: i64,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    let record = find_or_404(repository, id).await?;

    if let Err(e) = repository.record_download(id).await {
        tracing::warn!("Failed to count download of {} {}: {}", R::KIND, id, e);
    }

    let event = UsageEvent {
        resource_type: R::KIND,
        resource_id: id,
        user_email: user.map(|AuthenticatedUser(identity)| identity.email),
        created_at: Utc::now(),
    };
    if let Err(e) = usage.record(&event).await {
        tracing::warn!("Failed to log download of {} {}: {}", R::KIND, id, e);
    }

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, record.download_url()))
        .finish())
}
