use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::db::{DbError, Gateway};
use crate::model::attendance::AttendanceRecord;
use crate::store::AttendanceStore;

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, work_date, check_in, check_out, created_at, updated_at FROM attendance";

/// `attendance` table on MySQL. Day exclusivity comes from
/// `UNIQUE KEY uq_attendance_user_day (user_id, work_date)`.
pub struct MySqlAttendanceStore {
    gateway: Gateway,
}

impl MySqlAttendanceStore {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn insert_check_in(
        &self,
        user_id: u64,
        work_date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, DbError> {
        let result = self
            .gateway
            .run(
                "attendance.insert_check_in",
                sqlx::query(
                    r#"
                    INSERT INTO attendance
                        (user_id, work_date, check_in, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(user_id)
                .bind(work_date)
                .bind(at)
                .bind(at)
                .bind(at)
                .execute(self.gateway.pool()),
            )
            .await?;

        Ok(AttendanceRecord {
            id: result.last_insert_id(),
            user_id,
            work_date,
            check_in: at,
            check_out: None,
            created_at: at,
            updated_at: at,
        })
    }

    async fn close_open(
        &self,
        record_id: u64,
        user_id: u64,
        at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let result = self
            .gateway
            .run(
                "attendance.close_open",
                sqlx::query(
                    r#"
                    UPDATE attendance
                    SET check_out = ?, updated_at = ?
                    WHERE id = ?
                    AND user_id = ?
                    AND check_out IS NULL
                    "#,
                )
                .bind(at)
                .bind(at)
                .bind(record_id)
                .bind(user_id)
                .execute(self.gateway.pool()),
            )
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_owned(
        &self,
        record_id: u64,
        user_id: u64,
    ) -> Result<Option<AttendanceRecord>, DbError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ? AND user_id = ?");
        self.gateway
            .run(
                "attendance.find_owned",
                sqlx::query_as::<_, AttendanceRecord>(&sql)
                    .bind(record_id)
                    .bind(user_id)
                    .fetch_optional(self.gateway.pool()),
            )
            .await
    }

    async fn find_for_day(
        &self,
        user_id: u64,
        work_date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, DbError> {
        let sql = format!("{SELECT_COLUMNS} WHERE user_id = ? AND work_date = ?");
        self.gateway
            .run(
                "attendance.find_for_day",
                sqlx::query_as::<_, AttendanceRecord>(&sql)
                    .bind(user_id)
                    .bind(work_date)
                    .fetch_optional(self.gateway.pool()),
            )
            .await
    }
}
