//! Entry entity representing a stored short-URL mapping.

/// A stored mapping between a shard-encoded identifier and a destination URL.
///
/// Entries are immutable once stored: they are created by the write path,
/// never updated, and destroyed either individually (administrative deletion)
/// or in bulk by expired-row cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    pub id: u64,
    pub url: String,
    /// Expiration as unix seconds. `None` never expires.
    pub expire_at: Option<i64>,
}

impl UrlEntry {
    /// Creates a new entry.
    pub fn new(id: u64, url: impl Into<String>, expire_at: Option<i64>) -> Self {
        Self {
            id,
            url: url.into(),
            expire_at,
        }
    }

    /// Returns true if the entry is visible to reads at `now` (unix seconds).
    ///
    /// An entry with `expire_at = Some(t)` is visible only while `now < t`.
    pub fn is_visible(&self, now: i64) -> bool {
        match self.expire_at {
            None => true,
            Some(t) => now < t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpiring_entry_is_always_visible() {
        let entry = UrlEntry::new(1, "https://example.com", None);
        assert!(entry.is_visible(0));
        assert!(entry.is_visible(i64::MAX));
    }

    #[test]
    fn entry_visible_strictly_before_expiry() {
        let entry = UrlEntry::new(1, "https://example.com", Some(100));
        assert!(entry.is_visible(99));
        assert!(!entry.is_visible(100));
        assert!(!entry.is_visible(101));
    }
}
