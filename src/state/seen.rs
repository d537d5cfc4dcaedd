use dashmap::DashSet;
use std::sync::Arc;

/// Append-only set of canonical product URLs dispatched during one run
///
/// Cloning is cheap and every clone shares the same set. Entries are never
/// removed; the store's unique key backs this up across runs.
#[derive(Debug, Clone, Default)]
pub struct SeenProductSet {
    urls: Arc<DashSet<String>>,
}

impl SeenProductSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the URL has already been marked
    pub fn seen(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Atomically marks a URL as seen
    ///
    /// Returns `true` only for the single caller that inserted it; every
    /// concurrent or later caller for the same URL gets `false`.
    pub fn mark_seen(&self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    /// Number of URLs marked so far
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns true if nothing has been marked yet
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_seen_once() {
        let set = SeenProductSet::new();
        assert!(!set.seen("https://shop.example.com/product/a"));
        assert!(set.mark_seen("https://shop.example.com/product/a"));
        assert!(set.seen("https://shop.example.com/product/a"));
        assert!(!set.mark_seen("https://shop.example.com/product/a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_clones_share_entries() {
        let set = SeenProductSet::new();
        let other = set.clone();
        assert!(other.mark_seen("https://shop.example.com/product/a"));
        assert!(set.seen("https://shop.example.com/product/a"));
    }

    #[tokio::test]
    async fn test_concurrent_mark_has_single_winner() {
        let set = SeenProductSet::new();
        let mut handles = Vec::new();

        for _ in 0..16 {
            let set = set.clone();
            handles.push(tokio::spawn(async move {
                set.mark_seen("https://shop.example.com/product/contended")
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(set.len(), 1);
    }
}
