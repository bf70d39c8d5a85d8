use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

pub fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}

pub fn seconds(value: u64) -> Duration {
    Duration::from_secs(value)
}

/// `refreshed_at + interval`, saturating at the latest representable instant
pub fn expiration_after(refreshed_at: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(interval)
        .ok()
        .and_then(|delta| refreshed_at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiration_is_interval_after_refresh() {
        let refreshed_at = Utc::now();
        let expires_at = expiration_after(refreshed_at, minutes(30));
        assert_eq!(expires_at - refreshed_at, TimeDelta::minutes(30));
    }

    #[test]
    fn huge_interval_saturates() {
        let expires_at = expiration_after(Utc::now(), Duration::from_secs(u64::MAX));
        assert_eq!(expires_at, DateTime::<Utc>::MAX_UTC);
    }
}
