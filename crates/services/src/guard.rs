use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Marks a request issued under a given epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Drops responses that arrive after the state they were issued for changed.
///
/// Take a ticket before awaiting a request; `invalidate` when the context
/// changes (new file, language switch); apply the response only while
/// `is_current(ticket)` holds.
#[derive(Debug, Clone, Default)]
pub struct ResponseGuard {
    epoch: Arc<AtomicU64>,
}

impl ResponseGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ticket(&self) -> Ticket {
        Ticket(self.epoch.load(Ordering::Acquire))
    }

    /// Invalidate every outstanding ticket and return a fresh one.
    pub fn invalidate(&self) -> Ticket {
        Ticket(self.epoch.fetch_add(1, Ordering::AcqRel) + 1)
    }

    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.ticket() == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidation_retires_old_tickets() {
        let guard = ResponseGuard::new();
        let old = guard.ticket();
        assert!(guard.is_current(old));

        let fresh = guard.invalidate();
        assert!(!guard.is_current(old));
        assert!(guard.is_current(fresh));

        let clone = guard.clone();
        clone.invalidate();
        assert!(!guard.is_current(fresh));
    }
}
