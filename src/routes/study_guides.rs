use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use tracing::instrument;
use validator::Validate;

use crate::{
    core::{
        jwt_auth::{AdminUser, AuthenticatedUser},
        AppError, AppSuccessResponse, StorageClient,
    },
    db::{Library, Record},
    models::{
        listing,
        study_guides::{StudyGuide, StudyGuideDraft, StudyGuideListQuery, StudyGuideUpdate},
    },
    routes::{
        catalog::{find_or_404, list_or_refresh, serve_download},
        uploads::{read_upload_form, resolve_download_url},
    },
};

#[instrument(name = "List Study Guides", skip(library))]
#[get("")]
pub async fn list_study_guides(
    library: web::Data<Library>,
    query: web::Query<StudyGuideListQuery>,
) -> Result<impl Responder, AppError> {
    let query = query.into_inner();
    let guides = list_or_refresh(&library.study_guides, query.refresh).await?;

    let page = listing::apply(&guides, &query.to_list_query());
    let message = if page.meta.total_items == 0 {
        "No study guides match the current filters"
    } else {
        "Study guides retrieved successfully"
    };

    Ok(HttpResponse::Ok().json(AppSuccessResponse::paginated(message, page.items, page.meta)))
}

#[instrument(name = "Get Study Guide", skip(library))]
#[get("/{guide_id}")]
pub async fn get_study_guide(
    library: web::Data<Library>,
    guide_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let guide = find_or_404(&library.study_guides, guide_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new("Study guide retrieved successfully", guide)))
}

#[instrument(name = "Download Study Guide", skip(library, user))]
#[get("/{guide_id}/download")]
pub async fn download_study_guide(
    library: web::Data<Library>,
    guide_id: web::Path<i64>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    serve_download(
        &library.study_guides,
        library.usage.as_ref(),
        guide_id.into_inner(),
        user,
    )
    .await
}

#[instrument(name = "Upload Study Guide", skip(library, storage, payload))]
#[post("")]
pub async fn upload_study_guide(
    library: web::Data<Library>,
    storage: web::Data<StorageClient>,
    admin: AdminUser,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let mut form = read_upload_form(payload).await?;

    let mut draft = StudyGuideDraft::from_form(&form.fields).map_err(AppError::validation)?;
    draft.validate()?;

    let (download_url, format) =
        resolve_download_url(&mut form, &storage, StudyGuide::KIND, "guides").await?;
    draft.download_url = download_url;
    if draft.format.is_none() {
        draft.format = format;
    }

    let guide = library.study_guides.create(&draft).await?;

    tracing::info!(guide_id = guide.id, admin = %admin.0.email, "study guide uploaded");

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(
        "Study guide uploaded successfully",
        guide,
    )))
}

#[instrument(name = "Update Study Guide", skip(library))]
#[put("/{guide_id}")]
pub async fn update_study_guide(
    library: web::Data<Library>,
    admin: AdminUser,
    guide_id: web::Path<i64>,
    body: web::Json<StudyGuideUpdate>,
) -> Result<impl Responder, AppError> {
    let guide_id = guide_id.into_inner();
    let current = find_or_404(&library.study_guides, guide_id).await?;

    let draft = body.into_inner().apply(&current);
    draft.validate()?;

    let guide = library
        .study_guides
        .update(guide_id, &draft)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No study guide with id {}", guide_id)))?;

    tracing::info!(guide_id, admin = %admin.0.email, "study guide updated");

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new("Study guide updated successfully", guide)))
}

#[instrument(name = "Delete Study Guide", skip(library))]
#[delete("/{guide_id}")]
pub async fn delete_study_guide(
    library: web::Data<Library>,
    admin: AdminUser,
    guide_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let guide_id = guide_id.into_inner();

    if !library.study_guides.delete(guide_id).await? {
        return Err(AppError::not_found(format!("No study guide with id {}", guide_id)));
    }

    tracing::info!(guide_id, admin = %admin.0.email, "study guide deleted");

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        "Study guide deleted successfully",
        guide_id,
    )))
}
