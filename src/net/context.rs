//! Deadline-carrying dial context.

use std::time::Duration;
use tokio::time::Instant;

/// Stand-in for "no deadline" when a timeout does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Context passed to every dial capability.
///
/// Cancellation is driven by the deadline alone: capabilities bound their
/// own work with [`DialContext::deadline`], and the dial primitive stops
/// retrying once it has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialContext {
    deadline: Instant,
    timeout: Duration,
}

impl DialContext {
    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: deadline_after(timeout),
            timeout,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// The timeout this context was created with.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time left before the deadline (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Derive a context whose deadline is at most `limit` from now.
    ///
    /// The child never outlives its parent.
    pub fn child(&self, limit: Option<Duration>) -> Self {
        match limit {
            Some(limit) => {
                let candidate = deadline_after(limit);
                if candidate < self.deadline {
                    Self {
                        deadline: candidate,
                        timeout: limit,
                    }
                } else {
                    *self
                }
            }
            None => *self,
        }
    }
}
