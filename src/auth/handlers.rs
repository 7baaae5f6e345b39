use crate::{
    auth::{
        auth::{AuthUser, TOKEN_COOKIE},
        service::AuthService,
    },
    config::Config,
    error::AppError,
    models::{LoginReqDto, LoginResponse},
};
use actix_web::{
    HttpResponse,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    web,
};

/// Login endpoint
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body(content = LoginReqDto, content_type = "application/json"),
    responses(
        (status = 200, description = "Session issued; also set as the `token` cookie", body = LoginResponse),
        (status = 400, description = "Malformed credentials"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many login attempts"),
        (status = 503, description = "Storage unavailable, retry")
    ),
    tag = "Auth"
)]
pub async fn login(
    body: web::Json<LoginReqDto>,
    auth: web::Data<AuthService>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let outcome = auth.login(&body.email, &body.password).await?;

    let cookie = Cookie::build(TOKEN_COOKIE, outcome.issued.token.clone())
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(config.token_ttl))
        .finish();

    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse {
        token: outcome.issued.token,
        expires_at: outcome.issued.expires_at,
        user: outcome.user,
    }))
}

/// Logout endpoint. Tokens are stateless; this drops the cookie and always succeeds.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Session cookie cleared")),
    tag = "Auth"
)]
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(TOKEN_COOKIE, "").path("/").finish();
    cookie.make_removal();

    HttpResponse::NoContent().cookie(cookie).finish()
}

/// Current session
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Identity carried by the session", body = AuthUser),
        (status = 401, description = "Missing, invalid or expired session")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(auth)
}
