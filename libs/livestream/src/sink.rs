use tracing::trace;

use crate::event::{Event, EventSender};

/// A display surface that renders whatever source it is given.
///
/// Every `set_source` must eventually be answered by exactly one signal on
/// the [`SignalSender`] handed over with it. `clear_source` may stay silent
/// or report a failure on the previous sender; both are tolerated.
pub trait FrameSink: Send + 'static {
    fn set_source(&mut self, url: &str, signals: SignalSender);

    fn clear_source(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkSignal {
    Loaded,
    Failed,
}

/// Identifies one source assignment. Signals carrying an older id answer a
/// source that has since been replaced or cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(pub(crate) u64);

/// Feeds frame sink signals for a single source assignment back into the
/// monitor.
#[derive(Debug, Clone)]
pub struct SignalSender {
    events: EventSender,
    attempt: AttemptId,
}

impl SignalSender {
    pub(crate) fn new(events: EventSender, attempt: AttemptId) -> Self {
        Self { events, attempt }
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn loaded(&self) {
        self.send(SinkSignal::Loaded)
    }

    pub fn failed(&self) {
        self.send(SinkSignal::Failed)
    }

    pub fn send(&self, signal: SinkSignal) {
        let event = Event::Sink {
            attempt: self.attempt,
            signal,
        };
        if self.events.send(event).is_err() {
            trace!(?signal, attempt = ?self.attempt, "monitor gone, dropping sink signal");
        }
    }
}
