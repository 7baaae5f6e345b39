use crate::auth::auth::AuthUser;
use crate::model::attendance::AttendanceRecord;
use crate::model::role::Role;
use crate::model::user::User;
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance & session core

Issues session tokens, gates pages by role, and records one check-in and
one check-out per employee per work day.

### 🔐 Security
Endpoints take the session token either as `Authorization: Bearer <token>`
or as the `token` cookie set by login. Tokens expire after one day by default.

### ⏱ Retries
`503` responses are retryable. After a timed-out check-in, re-read
`/api/attendance/today` instead of posting again; check-out is safe to repeat.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            User,
            Role,
            AuthUser,
            AttendanceRecord
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Session APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
