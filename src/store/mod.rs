//! Storage seams for credentials and attendance.
//!
//! Cross-request invariants live in the storage layer: implementations must
//! make `insert_check_in` fail with [`DbError::Duplicate`] when a record for the
//! same `(user_id, work_date)` exists, and `close_open` must be a single
//! conditional write.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::db::DbError;
use crate::model::attendance::AttendanceRecord;
use crate::model::user::UserSql;

pub mod attendance;
#[cfg(test)]
pub mod memory;
pub mod user;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserSql>, DbError>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Opens the day's record, or `DbError::Duplicate` if one exists.
    async fn insert_check_in(
        &self,
        user_id: u64,
        work_date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, DbError>;

    /// Sets `check_out` iff the record is owned by `user_id` and still open.
    /// Returns whether a row changed.
    async fn close_open(
        &self,
        record_id: u64,
        user_id: u64,
        at: DateTime<Utc>,
    ) -> Result<bool, DbError>;

    async fn find_owned(
        &self,
        record_id: u64,
        user_id: u64,
    ) -> Result<Option<AttendanceRecord>, DbError>;

    async fn find_for_day(
        &self,
        user_id: u64,
        work_date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, DbError>;
}
