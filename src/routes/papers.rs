use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use tracing::instrument;
use validator::Validate;

use crate::{
    core::{
        jwt_auth::{AdminUser, AuthenticatedUser},
        AppError, AppErrorType, AppSuccessResponse, StorageClient,
    },
    db::{Library, Record},
    models::{
        listing,
        papers::{Paper, PaperDraft, PaperListQuery, PaperUpdate},
    },
    routes::{
        catalog::{find_or_404, list_or_refresh, serve_download},
        uploads::{read_upload_form, resolve_download_url},
    },
};

#[instrument(name = "List Papers", skip(library))]
#[get("")]
pub async fn list_papers(
    library: web::Data<Library>,
    query: web::Query<PaperListQuery>,
) -> Result<impl Responder, AppError> {
    let query = query.into_inner();
    let papers = list_or_refresh(&library.papers, query.refresh).await?;

    let page = listing::apply(&papers, &query.to_list_query());
    let message = if page.meta.total_items == 0 {
        "No papers match the current filters"
    } else {
        "Papers retrieved successfully"
    };

    Ok(HttpResponse::Ok().json(AppSuccessResponse::paginated(message, page.items, page.meta)))
}

#[instrument(name = "Get Paper", skip(library))]
#[get("/{paper_id}")]
pub async fn get_paper(
    library: web::Data<Library>,
    paper_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let paper = find_or_404(&library.papers, paper_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new("Paper retrieved successfully", paper)))
}

#[instrument(name = "Download Paper", skip(library, user))]
#[get("/{paper_id}/download")]
pub async fn download_paper(
    library: web::Data<Library>,
    paper_id: web::Path<i64>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    serve_download(
        &library.papers,
        library.usage.as_ref(),
        paper_id.into_inner(),
        user,
    )
    .await
}

#[instrument(name = "Upload Paper", skip(library, storage, payload))]
#[post("")]
pub async fn upload_paper(
    library: web::Data<Library>,
    storage: web::Data<StorageClient>,
    admin: AdminUser,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let mut form = read_upload_form(payload).await?;

    // Validate before anything is written to storage.
    let mut draft = PaperDraft::from_form(&form.fields);
    draft.validate()?;

    let (download_url, format) =
        resolve_download_url(&mut form, &storage, Paper::KIND, "papers").await?;
    draft.download_url = download_url;
    if draft.format.is_none() {
        draft.format = format;
    }

    let paper = library.papers.create(&draft).await.map_err(|e| {
        tracing::error!("Failed to save paper: {:?}", e);
        AppError {
            message: Some("Failed to save paper".to_string()),
            cause: Some(e.to_string()),
            error_type: AppErrorType::DbError,
        }
    })?;

    tracing::info!(paper_id = paper.id, admin = %admin.0.email, "paper uploaded");

    Ok(HttpResponse::Created().json(AppSuccessResponse::new("Paper uploaded successfully", paper)))
}

#[instrument(name = "Update Paper", skip(library))]
#[put("/{paper_id}")]
pub async fn update_paper(
    library: web::Data<Library>,
    admin: AdminUser,
    paper_id: web::Path<i64>,
    body: web::Json<PaperUpdate>,
) -> Result<impl Responder, AppError> {
    let paper_id = paper_id.into_inner();
    let current = find_or_404(&library.papers, paper_id).await?;

    let draft = body.into_inner().apply(&current);
    draft.validate()?;

    let paper = library
        .papers
        .update(paper_id, &draft)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No paper with id {}", paper_id)))?;

    tracing::info!(paper_id, admin = %admin.0.email, "paper updated");

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new("Paper updated successfully", paper)))
}

#[instrument(name = "Delete Paper", skip(library))]
#[delete("/{paper_id}")]
pub async fn delete_paper(
    library: web::Data<Library>,
    admin: AdminUser,
    paper_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let paper_id = paper_id.into_inner();

    if !library.papers.delete(paper_id).await? {
        return Err(AppError::not_found(format!("No paper with id {}", paper_id)));
    }

    tracing::info!(paper_id, admin = %admin.0.email, "paper deleted");

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new("Paper deleted successfully", paper_id)))
}
