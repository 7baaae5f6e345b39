use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::user::User;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    #[schema(example = "s3cret-passw0rd")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    #[schema(value_type = String, format = "date-time")]
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Session token payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// email
    pub sub: String,
    /// Role name; parsed against the closed role set on every verification.
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}
