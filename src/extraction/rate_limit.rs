//! Sliding-window rate limiting for the extraction endpoint.
//!
//! Two windows are checked against recorded events, hourly first so a user
//! who exhausted the hour sees the hourly message even when the minute window
//! is also full. The event is recorded only after both checks pass, so
//! rejected calls never consume quota.

use crate::config::{EXTRACTION_ENDPOINT, RateLimitConfig};
use crate::db::store::ExtractionStore;
use crate::errors::{Error, Result};
use crate::types::{UserId, abbrev_uuid};
use chrono::{Duration, Utc};
use std::sync::Arc;

pub struct RateLimiter {
    store: Arc<dyn ExtractionStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn ExtractionStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Enforce both windows for `user_id` and, if allowed, record the call.
    pub async fn check_and_record(&self, user_id: UserId) -> Result<()> {
        let now = Utc::now();

        let hour_count = self
            .store
            .count_rate_events(user_id, EXTRACTION_ENDPOINT, now - Duration::hours(1))
            .await?;
        if hour_count >= self.config.extractions_per_hour as u64 {
            tracing::info!(
                user_id = %abbrev_uuid(&user_id),
                hour_count,
                "Extraction rejected by hourly rate limit"
            );
            return Err(Error::RateLimited {
                message: format!(
                    "Hourly extraction limit reached ({} per hour). Try again later.",
                    self.config.extractions_per_hour
                ),
            });
        }

        let minute_count = self
            .store
            .count_rate_events(user_id, EXTRACTION_ENDPOINT, now - Duration::minutes(1))
            .await?;
        if minute_count >= self.config.extractions_per_minute as u64 {
            tracing::info!(
                user_id = %abbrev_uuid(&user_id),
                minute_count,
                "Extraction rejected by per-minute rate limit"
            );
            return Err(Error::RateLimited {
                message: format!(
                    "Too many extractions ({} per minute). Slow down a little.",
                    self.config.extractions_per_minute
                ),
            });
        }

        self.store
            .record_rate_event(user_id, EXTRACTION_ENDPOINT, now)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use uuid::Uuid;

    fn limiter(per_hour: u32, per_minute: u32) -> (RateLimiter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::new(
            store.clone(),
            RateLimitConfig {
                extractions_per_hour: per_hour,
                extractions_per_minute: per_minute,
            },
        );
        (limiter, store)
    }

    #[tokio::test]
    async fn test_allows_up_to_minute_cap() {
        let (limiter, _) = limiter(10, 5);
        let user = Uuid::new_v4();
        for _ in 0..5 {
            limiter.check_and_record(user).await.unwrap();
        }
        let err = limiter.check_and_record(user).await.unwrap_err();
        match err {
            Error::RateLimited { message } => assert!(message.contains("per minute"), "{message}"),
            other => panic!("expected RateLimited, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_hourly_message_when_hour_exhausted() {
        let (limiter, store) = limiter(10, 5);
        let user = Uuid::new_v4();
        // Backfill 10 events spread earlier in the hour so the minute window
        // is empty but the hourly window is full.
        let now = Utc::now();
        for i in 0..10 {
            store
                .record_rate_event(user, EXTRACTION_ENDPOINT, now - Duration::minutes(5 + i))
                .await
                .unwrap();
        }
        let err = limiter.check_and_record(user).await.unwrap_err();
        match err {
            Error::RateLimited { message } => assert!(message.contains("per hour"), "{message}"),
            other => panic!("expected RateLimited, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_hourly_checked_before_minute() {
        // Both windows full -> hourly message wins.
        let (limiter, store) = limiter(5, 5);
        let user = Uuid::new_v4();
        let now = Utc::now();
        for _ in 0..5 {
            store
                .record_rate_event(user, EXTRACTION_ENDPOINT, now)
                .await
                .unwrap();
        }
        let err = limiter.check_and_record(user).await.unwrap_err();
        match err {
            Error::RateLimited { message } => assert!(message.contains("per hour"), "{message}"),
            other => panic!("expected RateLimited, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_calls_do_not_consume_quota() {
        let (limiter, store) = limiter(10, 1);
        let user = Uuid::new_v4();
        limiter.check_and_record(user).await.unwrap();
        for _ in 0..3 {
            limiter.check_and_record(user).await.unwrap_err();
        }
        let count = store
            .count_rate_events(user, EXTRACTION_ENDPOINT, Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_old_events_fall_out_of_window() {
        let (limiter, store) = limiter(2, 5);
        let user = Uuid::new_v4();
        let stale = Utc::now() - Duration::hours(2);
        for _ in 0..5 {
            store
                .record_rate_event(user, EXTRACTION_ENDPOINT, stale)
                .await
                .unwrap();
        }
        limiter.check_and_record(user).await.unwrap();
    }

    #[tokio::test]
    async fn test_limits_are_per_user() {
        let (limiter, _) = limiter(10, 1);
        limiter.check_and_record(Uuid::new_v4()).await.unwrap();
        limiter.check_and_record(Uuid::new_v4()).await.unwrap();
    }
}
