use async_trait::async_trait;

use crate::db::{DbError, Gateway};
use crate::model::user::UserSql;
use crate::store::CredentialStore;

pub struct MySqlCredentialStore {
    gateway: Gateway,
}

impl MySqlCredentialStore {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl CredentialStore for MySqlCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserSql>, DbError> {
        self.gateway
            .run(
                "users.find_by_email",
                sqlx::query_as::<_, UserSql>(
                    r#"
                    SELECT id, email, password_hash, role, department_id
                    FROM users
                    WHERE email = ?
                    "#,
                )
                .bind(email)
                .fetch_optional(self.gateway.pool()),
            )
            .await
    }
}
