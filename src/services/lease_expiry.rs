// Lease expiry notifications
// A sweep scans a realtor's properties and records one notification per
// expiring lease. Duplicates are absorbed by the (realtor_id, message) key.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::models::{NewNotification, Property};
use crate::store::{InsertOutcome, Store, StoreError};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub expiring: usize,
    pub created: usize,
    pub already_notified: usize,
    pub failed: usize,
}

pub fn expiry_message(title: &str, lease_end: NaiveDate) -> String {
    format!(
        "Lease for \"{}\" expires on {}",
        title,
        lease_end.format("%B %-d, %Y")
    )
}

/// True when `lease_end` falls within `[today, today + window_days]`
pub fn is_expiring(lease_end: Option<NaiveDate>, today: NaiveDate, window_days: i64) -> bool {
    match lease_end {
        Some(end) => end >= today && end <= today + Duration::days(window_days),
        None => false,
    }
}

pub struct LeaseExpiryNotifier {
    store: Arc<dyn Store>,
    window_days: i64,
}

impl LeaseExpiryNotifier {
    pub fn new(store: Arc<dyn Store>, window_days: i64) -> Self {
        Self { store, window_days }
    }

    #[instrument(skip(self, properties), fields(count = properties.len()))]
    pub async fn sweep(
        &self,
        realtor_id: &str,
        properties: &[Property],
        now: DateTime<Utc>,
    ) -> SweepReport {
        let today = now.date_naive();
        let mut report = SweepReport {
            scanned: properties.len(),
            ..SweepReport::default()
        };

        for property in properties {
            let Some(lease_end) = property.lease_end else {
                continue;
            };
            if !is_expiring(Some(lease_end), today, self.window_days) {
                continue;
            }
            report.expiring += 1;

            let notification =
                NewNotification::unread(realtor_id, expiry_message(&property.title, lease_end), now);
            match self.store.insert_notification_if_absent(notification).await {
                Ok(InsertOutcome::Inserted) => report.created += 1,
                Ok(InsertOutcome::AlreadyExists) => report.already_notified += 1,
                Err(e) => {
                    warn!("Failed to record lease expiry for property {}: {}", property.id, e);
                    report.failed += 1;
                },
            }
        }

        debug!(?report, "Lease expiry sweep finished");
        report
    }

    /// Load the realtor's properties and sweep them
    pub async fn sweep_realtor(
        &self,
        realtor_id: &str,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, StoreError> {
        let properties = self.store.list_properties(realtor_id).await?;
        Ok(self.sweep(realtor_id, &properties, now).await)
    }
}
