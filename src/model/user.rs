use std::str::FromStr;

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::role::Role;

/// Row as stored in `users`.
#[derive(Debug, Clone, FromRow)]
pub struct UserSql {
    pub id: u64, // 👈 matches BIGINT UNSIGNED
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department_id: Option<u64>,
}

/// A user whose role has been validated against the closed set.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    pub role: Role,
    #[schema(example = 10, nullable = true)]
    pub department_id: Option<u64>,
}

impl TryFrom<&UserSql> for User {
    type Error = AppError;

    fn try_from(row: &UserSql) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(|_| {
            AppError::Internal(format!("user {} has unknown role {:?}", row.id, row.role))
        })?;

        Ok(User {
            id: row.id,
            email: row.email.clone(),
            role,
            department_id: row.department_id,
        })
    }
}
