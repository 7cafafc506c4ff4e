use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;

use crate::core::{jwt_auth::AuthenticatedUser, AccessPolicy, AppError, AppSuccessResponse};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrentUser {
    user_id: String,
    email: String,
    role: Option<String>,
    is_admin: bool,
}

/// The verified identity behind the bearer token and whether it may use the
/// admin surface.
#[get("/me")]
pub async fn me(
    user: AuthenticatedUser,
    policy: web::Data<dyn AccessPolicy>,
) -> Result<impl Responder, AppError> {
    let AuthenticatedUser(identity) = user;
    let is_admin = policy.is_admin(&identity);

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        "User retrieved successfully",
        CurrentUser {
            user_id: identity.user_id,
            email: identity.email,
            role: identity.role,
            is_admin,
        },
    )))
}
