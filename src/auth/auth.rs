use crate::{auth::jwt::TokenService, error::AppError, model::role::Role};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use chrono::{DateTime, Utc};
use futures::future::{Ready, ready};
use serde::Serialize;
use utoipa::ToSchema;

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Identity asserted by a verified session token.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
    #[schema(value_type = String, format = "date-time")]
    pub expires_at: DateTime<Utc>,
}

/// Bearer header first, then the `token` cookie.
pub fn extract_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        req.cookie(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already verified by the guard for this request.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let tokens = match req.app_data::<Data<TokenService>>() {
            Some(t) => t,
            None => return ready(Err(AppError::Internal("TokenService missing".to_string()))),
        };

        let token = match extract_token(req) {
            Some(t) => t,
            None => return ready(Err(AppError::TokenInvalid)),
        };

        ready(tokens.verify(&token).map_err(|reason| {
            tracing::debug!(reason = reason.as_ref(), "Token rejected");
            AppError::TokenInvalid
        }))
    }
}

impl AuthUser {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("{} not permitted", self.role)))
        }
    }
}
