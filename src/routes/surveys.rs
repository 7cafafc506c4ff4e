use actix_web::{post, web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    core::{jwt_auth::AuthenticatedUser, AppError, AppSuccessResponse},
    db::Library,
    models::surveys::SurveySubmission,
};

#[instrument(name = "Submit Survey", skip(library, user, body))]
#[post("")]
pub async fn submit_survey(
    library: web::Data<Library>,
    user: AuthenticatedUser,
    body: web::Json<SurveySubmission>,
) -> Result<impl Responder, AppError> {
    let AuthenticatedUser(identity) = user;
    let draft = body.into_inner().into_draft(&identity.email)?;

    let survey = library.surveys.submit(&draft).await.map_err(|e| {
        tracing::error!("Failed to save survey for {}: {:?}", identity.email, e);
        e
    })?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(
        "Thank you for your feedback",
        survey,
    )))
}
