//! Fixed-window upload rate limiting.
//!
//! One counter + window-start timestamp per (user, asset type), all behind a
//! single async mutex. Contention is one key per actively uploading user, so
//! the map-wide lock is not a bottleneck. Time is passed in explicitly so
//! window arithmetic is testable without a clock.

use chrono::{DateTime, Duration, Utc};
use inkpost_core::{AssetType, MediaError};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Clone, Copy, Debug)]
struct RateWindow {
    count: u32,
    window_start: DateTime<Utc>,
}

impl RateWindow {
    fn reset_at(&self, window: Duration) -> DateTime<Utc> {
        self.window_start + window
    }

    /// Atomic admit step: roll the window over if expired, then admit iff
    /// under the limit. Returns remaining slots or the reset time.
    fn check_and_increment(
        &mut self,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<u32, DateTime<Utc>> {
        if now - self.window_start >= window {
            self.count = 0;
            self.window_start = now;
        }
        if self.count < limit {
            self.count += 1;
            Ok(limit - self.count)
        } else {
            Err(self.reset_at(window))
        }
    }
}

/// A granted admission. `window_start` identifies the window the admission
/// was counted against; `release` uses it to refuse stale refunds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
}

pub struct UploadRateLimiter {
    windows: Mutex<HashMap<(Uuid, AssetType), RateWindow>>,
    max_uploads: u32,
    window: Duration,
}

impl UploadRateLimiter {
    pub fn new(max_uploads: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_uploads,
            window,
        }
    }

    /// Admit or reject one upload attempt. Check-and-increment happens under
    /// the lock, so concurrent requests from the same user cannot over-admit
    /// past the limit.
    pub async fn try_admit(
        &self,
        user_id: Uuid,
        asset_type: AssetType,
        now: DateTime<Utc>,
    ) -> Result<Admission, MediaError> {
        let mut windows = self.windows.lock().await;
        let entry = windows.entry((user_id, asset_type)).or_insert(RateWindow {
            count: 0,
            window_start: now,
        });
        match entry.check_and_increment(self.max_uploads, self.window, now) {
            Ok(remaining) => Ok(Admission {
                remaining,
                reset_at: entry.reset_at(self.window),
                window_start: entry.window_start,
            }),
            Err(reset_at) => Err(MediaError::RateLimitExceeded { reset_at }),
        }
    }

    /// Refund one admission after a downstream failure, so the failed attempt
    /// does not permanently cost the user a retry slot. The refund is skipped
    /// unless the entry is still on the admission's window: once the window
    /// rolls over (and possibly gets re-seeded by later admissions), a stale
    /// release must not decrement the new window's counter.
    pub async fn release(&self, user_id: Uuid, asset_type: AssetType, admission: Admission) {
        let mut windows = self.windows.lock().await;
        if let Some(entry) = windows.get_mut(&(user_id, asset_type)) {
            if entry.window_start == admission.window_start {
                entry.count = entry.count.saturating_sub(1);
            }
        }
    }

    /// Drop windows that expired more than one full window ago, to bound
    /// memory over long uptimes. Embedders call this periodically.
    pub async fn purge_expired(&self, now: DateTime<Utc>) {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        let grace = self.window;
        windows.retain(|_, w| now < w.reset_at(self.window) + grace);
        let purged = before - windows.len();
        if purged > 0 {
            tracing::debug!(purged, "purged expired rate-limit windows");
        }
    }
}
