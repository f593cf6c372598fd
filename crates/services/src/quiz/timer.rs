use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Fired once when a question's time limit runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerExpired {
    pub question_index: usize,
}

/// Countdown for a single question.
///
/// Cancelling (or dropping) the timer guarantees the expiry never fires, so a
/// stale timer cannot affect a later question.
#[derive(Debug)]
pub struct QuestionTimer {
    question_index: usize,
    deadline: Instant,
    task: JoinHandle<()>,
    fired: Option<oneshot::Receiver<TimerExpired>>,
}

impl QuestionTimer {
    /// Start counting down `limit` for `question_index`. Needs a tokio runtime.
    #[must_use]
    pub fn start(question_index: usize, limit: Duration) -> Self {
        let deadline = Instant::now() + limit;
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(TimerExpired { question_index });
        });

        Self {
            question_index,
            deadline,
            task,
            fired: Some(rx),
        }
    }

    #[must_use]
    pub fn question_index(&self) -> usize {
        self.question_index
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whole seconds left, rounded up: 14.2s left shows as 15.
    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        let remaining = self.remaining();
        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        u32::try_from(secs).unwrap_or(u32::MAX)
    }

    pub fn cancel(&mut self) {
        self.task.abort();
        self.fired = None;
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.fired.is_none()
    }

    /// Wait for the expiry.
    ///
    /// Returns `None` once the timer was cancelled or has already reported.
    /// Safe to use as a `tokio::select!` branch.
    pub async fn expired(&mut self) -> Option<TimerExpired> {
        let rx = self.fired.as_mut()?;
        let fired = rx.await.ok();
        self.fired = None;
        fired
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
