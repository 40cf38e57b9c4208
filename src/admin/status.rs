//! The transient banner shown above the admin list.

use std::time::{Duration, Instant};

/// How long a delete confirmation stays up.
pub const DELETE_LINGER: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Loading,
    Success,
    Error,
}

/// Loading and error banners stay until replaced; success banners expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    pub kind: BannerKind,
    pub message: String,
    expires_at: Option<Instant>,
}

impl StatusBanner {
    pub fn loading(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Loading,
            message: message.into(),
            expires_at: None,
        }
    }

    pub fn success(message: impl Into<String>, linger: Duration, now: Instant) -> Self {
        Self {
            kind: BannerKind::Success,
            message: message.into(),
            expires_at: Some(now + linger),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_success_banners_expire() {
        let now = Instant::now();
        let later = now + Duration::from_secs(60);

        let success = StatusBanner::success("Record successfully removed.", DELETE_LINGER, now);
        assert!(!success.is_expired(now + Duration::from_millis(1999)));
        assert!(success.is_expired(now + DELETE_LINGER));

        assert!(!StatusBanner::error("Deletion failed: nope").is_expired(later));
        assert!(!StatusBanner::loading("Removing record...").is_expired(later));
    }
}
