//! Bounded retry policy
//!
//! Shared by listing and product chains. Exhaustion is not an error: the
//! caller falls back to advancing the page or category.

/// Default bound on retries of one request chain
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Retry bound for render requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns true if a chain currently at `retry_count` may be re-issued
    ///
    /// The re-issued request carries `retry_count + 1`, which never exceeds
    /// `max_retries`.
    pub fn should_retry(&self, retry_count: u32) -> bool {
        should_retry(retry_count, self.max_retries)
    }
}

/// Pure retry predicate
pub fn should_retry(retry_count: u32, max_retries: u32) -> bool {
    retry_count < max_retries
}
