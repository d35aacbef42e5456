use tokio::sync::mpsc::UnboundedSender;

use crate::retry::RetryToken;
use crate::sink::{AttemptId, SinkSignal};
use crate::state::HealthStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Start,
    Stop,
    Shutdown,
}

/// Everything the monitor loop reacts to besides caller commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Sink { attempt: AttemptId, signal: SinkSignal },
    RetryDue(RetryToken),
    Health { epoch: u64, health: HealthStatus },
}

pub(crate) type EventSender = UnboundedSender<Event>;
