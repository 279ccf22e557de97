use crate::config::DEFAULT_NOTICE_SECS;
use std::time::Duration;
use tokio::time::Instant;

/// A message that disappears on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientNotice {
    pub message: String,
    pub expires_at: Instant,
}

/// Short-lived notices such as playback failures.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    lifetime: Duration,
    notices: Vec<TransientNotice>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_NOTICE_SECS))
    }
}

impl NoticeBoard {
    #[must_use]
    pub const fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            notices: Vec::new(),
        }
    }

    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn post(&mut self, message: impl Into<String>) {
        self.notices.push(TransientNotice {
            message: message.into(),
            expires_at: Instant::now() + self.lifetime,
        });
    }

    /// Drop expired notices and return the rest, oldest first.
    pub fn active(&mut self) -> &[TransientNotice] {
        let now = Instant::now();
        self.notices.retain(|n| n.expires_at > now);
        &self.notices
    }

    /// Most recent live notice.
    pub fn latest(&mut self) -> Option<&str> {
        self.active().last().map(|n| n.message.as_str())
    }

    /// Remove and return every live notice.
    pub fn drain(&mut self) -> Vec<TransientNotice> {
        self.active();
        std::mem::take(&mut self.notices)
    }
}
