use std::sync::Arc;

use actix_web::web::Data;
use tracing::{debug, info, instrument, warn};

use crate::auth::jwt::{IssuedToken, TokenService};
use crate::auth::password::PasswordHasher;
use crate::error::AppError;
use crate::model::user::User;
use crate::store::CredentialStore;

/// Verifies credentials against the store and issues sessions.
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: Data<TokenService>,
}

pub struct LoginOutcome {
    pub issued: IssuedToken,
    pub user: User,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: Data<TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    #[instrument(name = "auth_login", skip(self, email, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            info!("Validation failed: empty email or password");
            return Err(AppError::CredentialFormat(
                "email and password are required".to_string(),
            ));
        }

        debug!("Fetching user from database");
        let row = match self.users.find_by_email(&email).await? {
            Some(row) => row,
            None => {
                info!("Invalid credentials: user not found");
                return Err(self.hasher.check_absent(password));
            }
        };

        debug!(user_id = row.id, "Verifying password");
        if let Err(e) = self.hasher.check(password, &row.password_hash) {
            match &e {
                AppError::CredentialMismatch => info!("Invalid credentials: password mismatch"),
                other => warn!(user_id = row.id, error = %other, "Credential format error"),
            }
            return Err(e);
        }

        let user = User::try_from(&row)?;
        let issued = self.tokens.issue(&user)?;

        info!(user_id = user.id, role = %user.role, "Login successful");
        Ok(LoginOutcome { issued, user })
    }
}
