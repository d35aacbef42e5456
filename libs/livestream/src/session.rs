use std::time::Duration;

use tracing::{debug, info, trace};

use crate::endpoint;
use crate::event::EventSender;
use crate::retry::{RetryScheduler, RetryToken};
use crate::sink::{AttemptId, FrameSink, SignalSender, SinkSignal};
use crate::state::{reconcile, ConnectionState, DisplayStatus, Snapshot, StatusWrite};

/// Single authority over the connection state and the frame sink source.
pub struct StreamSession<S> {
    target: String,
    sink: S,
    state: ConnectionState,
    status: DisplayStatus,
    retry: RetryScheduler,
    retry_delay: Duration,
    events: EventSender,
    attempt: AttemptId,
}

impl<S: FrameSink> StreamSession<S> {
    pub(crate) fn new(
        target: String,
        sink: S,
        retry: RetryScheduler,
        retry_delay: Duration,
        events: EventSender,
    ) -> Self {
        Self {
            target,
            sink,
            state: ConnectionState::Idle,
            status: DisplayStatus::Idle,
            retry,
            retry_delay,
            events,
            attempt: AttemptId(0),
        }
    }

    /// Assigns a freshly cache-busted source. Restarts the attempt when
    /// already connecting.
    pub fn start(&mut self) {
        self.retry.cancel();
        self.transition(ConnectionState::Connecting);

        let attempt = self.next_attempt();
        let source = endpoint::cache_busted(&self.target);
        debug!(%source, ?attempt, "assign frame sink source");
        let signals = SignalSender::new(self.events.clone(), attempt);
        self.sink.set_source(&source, signals);
    }

    pub fn stop(&mut self) {
        self.retry.cancel();
        // Anything the cleared source still reports is stale.
        self.next_attempt();
        // Must precede clear_source: some sinks report a failure when their
        // source is removed.
        self.transition(ConnectionState::Stopped);
        self.sink.clear_source();
    }

    pub fn on_frame_sink_loaded(&mut self) {
        self.retry.cancel();
        self.transition(ConnectionState::Live);
    }

    pub fn on_frame_sink_failed(&mut self) {
        if self.state == ConnectionState::Stopped {
            debug!("ignore frame sink failure after stop");
            return;
        }
        self.transition(ConnectionState::Unreachable);
        let token = self.retry.schedule(self.retry_delay);
        debug!(?token, delay = ?self.retry_delay, "retry scheduled");
    }

    /// Routes a sink signal, dropping it unless it answers the current
    /// source assignment.
    pub fn on_sink_signal(&mut self, attempt: AttemptId, signal: SinkSignal) {
        if attempt != self.attempt {
            trace!(?attempt, current = ?self.attempt, ?signal, "stale sink signal");
            return;
        }
        match signal {
            SinkSignal::Loaded => self.on_frame_sink_loaded(),
            SinkSignal::Failed => self.on_frame_sink_failed(),
        }
    }

    pub(crate) fn on_retry_due(&mut self, token: RetryToken) {
        if !self.retry.claim(token) {
            trace!(?token, "stale retry");
            return;
        }
        match self.state {
            ConnectionState::Live | ConnectionState::Stopped => {
                debug!(state = %self.state, "skip retry");
            }
            _ => {
                info!(url = %self.target, "retrying stream");
                self.start();
            }
        }
    }

    pub fn apply(&mut self, write: StatusWrite) {
        self.status = reconcile(self.status, write);
    }

    fn next_attempt(&mut self) -> AttemptId {
        self.attempt = AttemptId(self.attempt.0 + 1);
        self.attempt
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            info!(from = %self.state, to = %next, "connection state");
        }
        self.state = next;
        self.apply(StatusWrite::Session(next));
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn status(&self) -> DisplayStatus {
        self.status
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            status: self.status,
        }
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn retry_pending(&self) -> bool {
        self.retry.is_pending()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
