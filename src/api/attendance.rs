use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::ledger::AttendanceLedger;
use crate::model::attendance::AttendanceRecord;
use actix_web::{HttpResponse, web};

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in successfully", body = AttendanceRecord),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "error": "already_checked_in",
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Storage unavailable; re-read /api/attendance/today before retrying")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
) -> Result<HttpResponse, AppError> {
    let record = ledger.check_in(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/{id}/check-out",
    params(("id" = u64, Path, description = "Attendance record id")),
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceRecord),
        (status = 400, description = "Record not found for this user, or already checked out", body = Object, example = json!({
            "error": "already_checked_out",
            "message": "Attendance record is already checked out"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Storage unavailable, safe to retry")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    path: web::Path<u64>,
    ledger: web::Data<AttendanceLedger>,
) -> Result<HttpResponse, AppError> {
    let record = ledger.check_out(path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Today's record for the caller
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Record for the current work day", body = AttendanceRecord),
        (status = 204, description = "Not checked in today"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
) -> Result<HttpResponse, AppError> {
    Ok(match ledger.today(auth.user_id).await? {
        Some(record) => HttpResponse::Ok().json(record),
        None => HttpResponse::NoContent().finish(),
    })
}
