use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

use crate::event::{Event, EventSender};

/// Identifies one scheduled retry. Only the pending token may be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryToken(u64);

#[derive(Debug)]
struct PendingRetry {
    token: RetryToken,
    timer: JoinHandle<()>,
}

/// Owns the single outstanding retry timer.
///
/// When the timer elapses a `RetryDue` event is queued for the monitor loop,
/// which must `claim` the token before acting on it. A cancelled or
/// superseded retry can no longer be claimed even if its event is already
/// sitting in the queue.
#[derive(Debug)]
pub struct RetryScheduler {
    events: EventSender,
    pending: Option<PendingRetry>,
    issued: u64,
}

impl RetryScheduler {
    pub(crate) fn new(events: EventSender) -> Self {
        Self {
            events,
            pending: None,
            issued: 0,
        }
    }

    /// Replaces any pending retry with a new one firing after `delay`.
    pub fn schedule(&mut self, delay: Duration) -> RetryToken {
        self.cancel();

        self.issued += 1;
        let token = RetryToken(self.issued);
        let events = self.events.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::RetryDue(token));
        });

        trace!(?token, ?delay, "retry scheduled");
        self.pending = Some(PendingRetry { token, timer });
        token
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.timer.abort();
            trace!(token = ?pending.token, "retry cancelled");
        }
    }

    /// Returns true exactly once for the currently pending token.
    pub fn claim(&mut self, token: RetryToken) -> bool {
        match &self.pending {
            Some(pending) if pending.token == token => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
