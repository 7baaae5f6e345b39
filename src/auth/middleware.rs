use crate::auth::auth::{AuthUser, TOKEN_COOKIE};
use crate::auth::jwt::TokenService;
use crate::config::GuardConfig;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::LOCATION,
    web::Data,
};
use serde_json::json;
use tracing::debug;

/// Outcome of gating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Authorization {
    /// Not gated (API routes, unprotected pages, auth pages without a session).
    Public,
    Authenticated(AuthUser),
    /// Valid session on the login/register page.
    AlreadyAuthenticated,
    Unauthenticated,
    Forbidden,
}

/// Path- and role-based gate in front of every request.
pub struct Guard {
    tokens: Data<TokenService>,
    api_prefix: String,
    config: GuardConfig,
}

/// `/admin` covers `/admin` and `/admin/...`, not `/administrator`.
fn under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return false;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl Guard {
    pub fn new(tokens: Data<TokenService>, api_prefix: &str, config: GuardConfig) -> Self {
        Self {
            tokens,
            api_prefix: api_prefix.to_string(),
            config,
        }
    }

    fn session(&self, token: Option<&str>) -> Option<AuthUser> {
        let token = token?;
        match self.tokens.verify(token) {
            Ok(user) => Some(user),
            Err(reason) => {
                debug!(reason = reason.as_ref(), "Session token rejected");
                None
            }
        }
    }

    fn allowed_roles(&self, path: &str) -> Option<&[Role]> {
        self.config
            .role_prefixes
            .iter()
            .find(|(prefix, _)| under(path, prefix))
            .map(|(_, roles)| roles.as_slice())
    }

    pub fn authorize(&self, token: Option<&str>, path: &str) -> Authorization {
        // API handlers authorize themselves.
        if under(path, &self.api_prefix) {
            return Authorization::Public;
        }

        if under(path, &self.config.login_path) || under(path, &self.config.register_path) {
            return match self.session(token) {
                Some(_) => Authorization::AlreadyAuthenticated,
                None => Authorization::Public,
            };
        }

        let protected = self
            .config
            .protected_prefixes
            .iter()
            .any(|prefix| under(path, prefix));
        let roles = self.allowed_roles(path);

        if !protected && roles.is_none() {
            return Authorization::Public;
        }

        let Some(user) = self.session(token) else {
            return Authorization::Unauthenticated;
        };

        if let Some(roles) = roles {
            if let Err(e) = user.require_role(roles) {
                debug!(user_id = user.user_id, path, error = %e, "Role check failed");
                return Authorization::Forbidden;
            }
        }

        Authorization::Authenticated(user)
    }

    fn redirect(&self, to: &str) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((LOCATION, to.to_string()))
            .finish()
    }
}

pub async fn guard_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let guard = req
        .app_data::<Data<Guard>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Guard missing"))?;

    let token = req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string());
    // Percent-decoded, as the router sees it; `req.path()` is still raw.
    let path = req.match_info().as_str().to_string();

    match guard.authorize(token.as_deref(), &path) {
        Authorization::Public => next.call(req).await,
        Authorization::Authenticated(user) => {
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Authorization::AlreadyAuthenticated => {
            let resp = guard.redirect(&guard.config.landing_path);
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
        Authorization::Unauthenticated => {
            let resp = guard.redirect(&guard.config.login_path);
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
        Authorization::Forbidden => {
            let resp = HttpResponse::Forbidden().json(json!({"error": "forbidden"}));
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}
