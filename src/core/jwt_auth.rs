use actix_web::dev::Payload;
use actix_web::{http, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use super::access_policy::AccessPolicy;
use super::config::AuthConfig;
use super::AppError;

/// Claims carried by access tokens from the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IdentityClaims {
    pub sub: String, // provider user id
    pub email: Option<String>,
    pub role: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
    pub role: Option<String>,
}

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(audience) = &config.audience {
            validation.set_audience(&[audience]);
        }

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<UserIdentity, AppError> {
        let claims = decode::<IdentityClaims>(token, &self.key, &self.validation)
            .map_err(|e| {
                tracing::warn!("Rejected access token: {}", e);
                AppError::unauthorized("Invalid token")
            })?
            .claims;

        let email = claims
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| AppError::unauthorized("Token carries no email"))?;

        Ok(UserIdentity {
            user_id: claims.sub,
            email,
            role: claims.role,
        })
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<UserIdentity, AppError> {
    let verifier = req
        .app_data::<web::Data<JwtVerifier>>()
        .ok_or_else(|| AppError::internal_error("token verifier is not configured"))?;

    let token =
        bearer_token(req).ok_or_else(|| AppError::unauthorized("Invalid login credentials"))?;

    verifier.verify(token)
}

/// Any signed-in user.
#[derive(Debug)]
pub struct AuthenticatedUser(pub UserIdentity);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(AuthenticatedUser))
    }
}

/// A signed-in user the configured access policy treats as an administrator.
#[derive(Debug)]
pub struct AdminUser(pub UserIdentity);

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = authenticate(req).and_then(|identity| {
            let policy = req
                .app_data::<web::Data<dyn AccessPolicy>>()
                .ok_or_else(|| AppError::internal_error("access policy is not configured"))?;

            if policy.is_admin(&identity) {
                Ok(AdminUser(identity))
            } else {
                tracing::warn!(user = %identity.email, "non-admin attempted an admin action");
                Err(AppError::forbidden_error("Administrator access required"))
            }
        });

        ready(result)
    }
}
