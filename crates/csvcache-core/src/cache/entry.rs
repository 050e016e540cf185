use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A cached value together with when it was written and how long it lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
    pub ttl_secs: u64,
}

impl<T> CachedData<T> {
    pub fn new(data: T, ttl_secs: u64) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
            ttl_secs,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX);
        self.cached_at
            .checked_add_signed(Duration::seconds(ttl.min(i64::MAX / 1000)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at()
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}
