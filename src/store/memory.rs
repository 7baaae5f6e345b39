//! In-memory stores with the same atomicity as the MySQL schema.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::db::DbError;
use crate::model::attendance::AttendanceRecord;
use crate::model::user::UserSql;
use crate::store::{AttendanceStore, CredentialStore};

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<HashMap<String, UserSql>>,
}

impl MemoryCredentialStore {
    pub fn with_user(self, user: UserSql) -> Self {
        self.users.lock().unwrap().insert(user.email.clone(), user);
        self
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserSql>, DbError> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }
}

#[derive(Default)]
pub struct MemoryAttendanceStore {
    rows: Mutex<Vec<AttendanceRecord>>,
    /// When set, every call fails as if the pool were exhausted.
    pub unavailable: std::sync::atomic::AtomicBool,
}

impl MemoryAttendanceStore {
    pub fn rows(&self) -> Vec<AttendanceRecord> {
        self.rows.lock().unwrap().clone()
    }

    fn check_available(&self, query: &'static str) -> Result<(), DbError> {
        if self.unavailable.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DbError::Unavailable {
                query,
                reason: "pool timed out".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn insert_check_in(
        &self,
        user_id: u64,
        work_date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, DbError> {
        let query = "attendance.insert_check_in";
        self.check_available(query)?;

        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.user_id == user_id && r.work_date == work_date)
        {
            return Err(DbError::Duplicate { query });
        }

        let record = AttendanceRecord {
            id: rows.len() as u64 + 1,
            user_id,
            work_date,
            check_in: at,
            check_out: None,
            created_at: at,
            updated_at: at,
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn close_open(
        &self,
        record_id: u64,
        user_id: u64,
        at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        self.check_available("attendance.close_open")?;

        let mut rows = self.rows.lock().unwrap();
        match rows
            .iter_mut()
            .find(|r| r.id == record_id && r.user_id == user_id && r.check_out.is_none())
        {
            Some(row) => {
                row.check_out = Some(at);
                row.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_owned(
        &self,
        record_id: u64,
        user_id: u64,
    ) -> Result<Option<AttendanceRecord>, DbError> {
        self.check_available("attendance.find_owned")?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == record_id && r.user_id == user_id)
            .cloned())
    }

    async fn find_for_day(
        &self,
        user_id: u64,
        work_date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, DbError> {
        self.check_available("attendance.find_for_day")?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.work_date == work_date)
            .cloned())
    }
}
