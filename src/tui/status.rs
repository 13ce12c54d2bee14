//! Transient status line messages.

use std::time::{Duration, Instant};

/// How long a status message stays on screen.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

/// A short-lived message shown above the key-binding footer.
///
/// Messages expire by age rather than explicit clearing; the render loop
/// simply stops drawing them once [`StatusMessage::visible`] goes false.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    text: String,
    created_at: Instant,
}

impl StatusMessage {
    /// Stamp a new message with the current time.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: Instant::now(),
        }
    }

    #[cfg(test)]
    fn at(text: &str, created_at: Instant) -> Self {
        Self {
            text: text.to_string(),
            created_at,
        }
    }

    /// The message body.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the message should still be displayed at `now`.
    #[must_use]
    pub fn visible(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) < STATUS_TTL
    }

    /// When the message will stop being displayed.
    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.created_at + STATUS_TTL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_within_ttl_window() {
        let start = Instant::now();
        let msg = StatusMessage::at("Retried job", start);
        assert!(msg.visible(start));
        assert!(msg.visible(start + Duration::from_millis(2900)));
        assert!(!msg.visible(start + Duration::from_millis(3100)));
    }

    #[test]
    fn expiry_matches_ttl() {
        let start = Instant::now();
        let msg = StatusMessage::at("x", start);
        assert_eq!(msg.expires_at(), start + STATUS_TTL);
    }
}
