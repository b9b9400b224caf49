use chrono::{DateTime, TimeDelta, Utc};
use cfgsweep_core::{AppError, AppResult};

/// Minimum age a candidate must reach before it may be swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    period: TimeDelta,
}

impl RetentionPolicy {
    /// Creates a policy from a non-negative period.
    pub fn new(period: TimeDelta) -> AppResult<Self> {
        if period < TimeDelta::zero() {
            return Err(AppError::Validation(
                "retention period must not be negative".to_owned(),
            ));
        }

        Ok(Self { period })
    }

    /// Creates a policy from a standard library duration.
    pub fn from_std(period: std::time::Duration) -> AppResult<Self> {
        let period = TimeDelta::from_std(period).map_err(|error| {
            AppError::Validation(format!("retention period is out of range: {error}"))
        })?;
        Self::new(period)
    }

    /// Returns the retention period.
    #[must_use]
    pub fn period(&self) -> TimeDelta {
        self.period
    }

    /// Returns true when an object created at `creation_time` is at least `period` old at `now`.
    #[must_use]
    pub fn is_expired(&self, creation_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(creation_time) >= self.period
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            period: TimeDelta::days(30),
        }
    }
}
