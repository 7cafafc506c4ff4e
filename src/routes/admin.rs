use actix_web::{get, web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    core::{jwt_auth::AdminUser, AppError, AppSuccessResponse},
    db::Library,
    models::analytics::{DashboardCounts, SurveyAnalytics},
};

#[instrument(name = "Survey Analytics", skip(library, _admin))]
#[get("/analytics/surveys")]
pub async fn survey_analytics(
    library: web::Data<Library>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let surveys = library.surveys.list().await?;
    let analytics = SurveyAnalytics::from_surveys(&surveys);

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        "Survey analytics retrieved successfully",
        analytics,
    )))
}

#[instrument(name = "List Surveys", skip(library, _admin))]
#[get("/surveys")]
pub async fn list_surveys(
    library: web::Data<Library>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let surveys = library.surveys.list().await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        "Surveys retrieved successfully",
        surveys.as_ref(),
    )))
}

#[instrument(name = "Usage Summary", skip(library, _admin))]
#[get("/usage")]
pub async fn usage_summary(
    library: web::Data<Library>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let summary = library.usage.summary().await.map_err(|e| {
        tracing::error!("Failed to summarise resource usage: {:?}", e);
        e
    })?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        "Usage summary retrieved successfully",
        summary,
    )))
}

#[instrument(name = "Dashboard", skip(library, _admin))]
#[get("/dashboard")]
pub async fn dashboard(
    library: web::Data<Library>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let (papers, books, study_guides, surveys) = futures_util::try_join!(
        library.papers.list(),
        library.books.list(),
        library.study_guides.list(),
        library.surveys.list(),
    )?;

    let counts = DashboardCounts {
        papers: papers.len(),
        books: books.len(),
        study_guides: study_guides.len(),
        surveys: surveys.len(),
    };

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        "Dashboard retrieved successfully",
        counts,
    )))
}
