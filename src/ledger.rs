//! Check-in / check-out lifecycle.
//!
//! The ledger holds no locks of its own. Exactly-once semantics come from the
//! store: a unique `(user_id, work_date)` key for check-in and a conditional
//! `UPDATE ... WHERE check_out IS NULL` for check-out, so they hold across
//! server processes.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::{debug, info};

use crate::db::DbError;
use crate::error::AppError;
use crate::model::attendance::AttendanceRecord;
use crate::store::AttendanceStore;
use crate::utils::clock::Clock;

pub struct AttendanceLedger {
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
    zone: FixedOffset,
}

impl AttendanceLedger {
    pub fn new(store: Arc<dyn AttendanceStore>, clock: Arc<dyn Clock>, zone: FixedOffset) -> Self {
        Self { store, clock, zone }
    }

    /// Calendar day of `at` in the work zone.
    pub fn work_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.zone).date_naive()
    }

    pub async fn check_in(&self, user_id: u64) -> Result<AttendanceRecord, AppError> {
        let now = self.clock.now();
        let day = self.work_date(now);

        match self.store.insert_check_in(user_id, day, now).await {
            Ok(record) => {
                info!(user_id, record_id = record.id, %day, "Checked in");
                Ok(record)
            }
            Err(DbError::Duplicate { .. }) => {
                debug!(user_id, %day, "Duplicate check-in rejected");
                Err(AppError::AlreadyCheckedIn)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Safe to retry: once closed, every further call is `AlreadyCheckedOut`.
    pub async fn check_out(&self, record_id: u64, user_id: u64) -> Result<AttendanceRecord, AppError> {
        let now = self.clock.now();

        if self.store.close_open(record_id, user_id, now).await? {
            info!(user_id, record_id, "Checked out");
            return self
                .store
                .find_owned(record_id, user_id)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!("record {record_id} vanished after check-out"))
                });
        }

        // Nothing changed: tell "not yours / missing" apart from "already closed".
        match self.store.find_owned(record_id, user_id).await? {
            None => Err(AppError::RecordNotFound),
            Some(record) if record.is_closed() => {
                debug!(user_id, record_id, "Repeated check-out rejected");
                Err(AppError::AlreadyCheckedOut)
            }
            Some(_) => Err(AppError::Internal(format!(
                "record {record_id} open but conditional close matched nothing"
            ))),
        }
    }

    /// Caller's record for the current work day, used to re-read state after a
    /// timed-out mutation.
    pub async fn today(&self, user_id: u64) -> Result<Option<AttendanceRecord>, AppError> {
        let day = self.work_date(self.clock.now());
        Ok(self.store.find_for_day(user_id, day).await?)
    }
}
