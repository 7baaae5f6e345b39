use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use uuid::Uuid;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{role::Role, user::User},
    models::Claims,
    utils::clock::Clock,
};

/// Why a token was refused. Logged, never shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum TokenRejection {
    Malformed,
    BadSignature,
    Expired,
    UnknownRole,
}

pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 session tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// A `ttl_secs` beyond what `Duration` holds saturates; `issue` then fails.
    pub fn new(secret: &str, ttl_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::try_seconds(ttl_secs).unwrap_or(Duration::MAX),
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, AppError> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(format!("token expiry overflows: ttl {}", self.ttl)))?;

        let claims = Claims {
            user_id: user.id,
            sub: user.email.clone(),
            role: user.role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature, structure, expiry and role. Never panics on bad input.
    pub fn verify(&self, token: &str) -> Result<AuthUser, TokenRejection> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the service clock, without leeway.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenRejection::BadSignature,
                ErrorKind::ExpiredSignature => TokenRejection::Expired,
                _ => TokenRejection::Malformed,
            })?;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenRejection::Expired);
        }

        let role = Role::from_str(&claims.role).map_err(|_| TokenRejection::UnknownRole)?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role,
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .ok_or(TokenRejection::Malformed)?,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_user(id: u64, role: Role) -> User {
    User {
        id,
        email: format!("user{id}@company.com"),
        role,
        department_id: Some(10),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::testing::ManualClock;

    fn service(clock: Arc<ManualClock>) -> TokenService {
        TokenService::new("test-secret", 86_400, clock)
    }

    #[test]
    fn test_issue_then_verify() {
        let clock = Arc::new(ManualClock::at(2026, 1, 5, 8, 0));
        let tokens = service(clock);

        let issued = tokens.issue(&test_user(7, Role::Manager)).unwrap();
        let user = tokens.verify(&issued.token).unwrap();

        assert_eq!(user.user_id, 7);
        assert_eq!(user.email, "user7@company.com");
        assert_eq!(user.role, Role::Manager);
        assert_eq!(user.expires_at, issued.expires_at);
    }

    #[test]
    fn test_expired_after_ttl() {
        let clock = Arc::new(ManualClock::at(2026, 1, 5, 8, 0));
        let tokens = service(clock.clone());
        let issued = tokens.issue(&test_user(1, Role::Employee)).unwrap();

        clock.advance(Duration::hours(23));
        assert!(tokens.verify(&issued.token).is_ok());

        clock.advance(Duration::hours(1));
        assert_eq!(
            tokens.verify(&issued.token).unwrap_err(),
            TokenRejection::Expired
        );
    }

    #[test]
    fn test_oversized_ttl_fails_instead_of_panicking() {
        let clock = Arc::new(ManualClock::at(2026, 1, 5, 8, 0));
        for ttl in [10_000_000_000_000, i64::MAX] {
            let tokens = TokenService::new("test-secret", ttl, clock.clone());
            assert!(matches!(
                tokens.issue(&test_user(1, Role::Employee)),
                Err(AppError::Internal(_))
            ));
        }
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let clock = Arc::new(ManualClock::at(2026, 1, 5, 8, 0));
        let tokens = service(clock);
        let issued = tokens.issue(&test_user(1, Role::Employee)).unwrap();

        let mut parts: Vec<String> = issued.token.split('.').map(str::to_string).collect();
        let sig = parts[2].clone();
        let flipped = if sig.starts_with('A') { "B" } else { "A" };
        parts[2] = format!("{flipped}{}", &sig[1..]);

        assert!(tokens.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let clock = Arc::new(ManualClock::at(2026, 1, 5, 8, 0));
        let tokens = service(clock);
        let employee = tokens.issue(&test_user(1, Role::Employee)).unwrap();
        let admin = tokens.issue(&test_user(1, Role::Admin)).unwrap();

        // Employee header + signature around the admin payload.
        let e: Vec<&str> = employee.token.split('.').collect();
        let a: Vec<&str> = admin.token.split('.').collect();
        let forged = format!("{}.{}.{}", e[0], a[1], e[2]);

        assert_eq!(
            tokens.verify(&forged).unwrap_err(),
            TokenRejection::BadSignature
        );
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let clock = Arc::new(ManualClock::at(2026, 1, 5, 8, 0));
        let ours = service(clock.clone());
        let theirs = TokenService::new("other-secret", 86_400, clock);
        let issued = theirs.issue(&test_user(1, Role::Admin)).unwrap();

        assert_eq!(
            ours.verify(&issued.token).unwrap_err(),
            TokenRejection::BadSignature
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let clock = Arc::new(ManualClock::at(2026, 1, 5, 8, 0));
        let tokens = service(clock);

        for garbage in ["", "abc", "a.b.c", "....."] {
            assert_eq!(
                tokens.verify(garbage).unwrap_err(),
                TokenRejection::Malformed,
                "{garbage:?}"
            );
        }
    }

    #[test]
    fn test_unknown_role_claim_rejected() {
        let clock = Arc::new(ManualClock::at(2026, 1, 5, 8, 0));
        let tokens = service(clock.clone());
        let claims = Claims {
            user_id: 1,
            sub: "root@company.com".to_string(),
            role: "superuser".to_string(),
            iat: clock.now().timestamp(),
            exp: clock.now().timestamp() + 60,
            jti: "x".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert_eq!(
            tokens.verify(&token).unwrap_err(),
            TokenRejection::UnknownRole
        );
    }
}
