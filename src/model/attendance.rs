use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One employee's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "user_id": 1000,
    "work_date": "2026-01-05",
    "check_in": "2026-01-05T08:00:00Z",
    "check_out": null,
    "created_at": "2026-01-05T08:00:00Z",
    "updated_at": "2026-01-05T08:00:00Z"
}))]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,
    /// Calendar day of `check_in` in the configured work zone.
    #[schema(value_type = String, format = "date")]
    pub work_date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub check_in: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub check_out: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Closed records are immutable.
    pub fn is_closed(&self) -> bool {
        self.check_out.is_some()
    }
}
