use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether video is currently flowing into the frame sink.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Live,
    Unreachable,
    Stopped,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Live => "live",
            ConnectionState::Unreachable => "unreachable",
            ConnectionState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of the publisher health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub publisher_initialized: bool,
    pub has_frame: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    #[default]
    Idle,
    Connecting,
    Live,
    NoFrame,
    Stopped,
    PublisherNotInitialized,
    WaitingForFrame,
    StatusEndpointMisconfigured,
}

impl DisplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStatus::Idle => "idle",
            DisplayStatus::Connecting => "connecting...",
            DisplayStatus::Live => "live",
            DisplayStatus::NoFrame => "no frame yet or bad URL",
            DisplayStatus::Stopped => "stopped",
            DisplayStatus::PublisherNotInitialized => "publisher not initialized",
            DisplayStatus::WaitingForFrame => "waiting for first video frame",
            DisplayStatus::StatusEndpointMisconfigured => {
                "status endpoint unavailable: stream URL must end in /stream"
            }
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ConnectionState> for DisplayStatus {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Idle => DisplayStatus::Idle,
            ConnectionState::Connecting => DisplayStatus::Connecting,
            ConnectionState::Live => DisplayStatus::Live,
            ConnectionState::Unreachable => DisplayStatus::NoFrame,
            ConnectionState::Stopped => DisplayStatus::Stopped,
        }
    }
}

/// Something that wants to change the displayed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWrite {
    Session(ConnectionState),
    Health(HealthStatus),
    Misconfigured,
}

/// Last writer wins. Session transitions always write; a health report only
/// writes when it explains why frames are not flowing yet.
pub fn reconcile(current: DisplayStatus, write: StatusWrite) -> DisplayStatus {
    match write {
        StatusWrite::Session(state) => state.into(),
        StatusWrite::Health(health) if !health.publisher_initialized => {
            DisplayStatus::PublisherNotInitialized
        }
        StatusWrite::Health(health) if !health.has_frame => DisplayStatus::WaitingForFrame,
        StatusWrite::Health(_) => current,
        StatusWrite::Misconfigured => DisplayStatus::StatusEndpointMisconfigured,
    }
}

/// What a caller observes after every handled event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub state: ConnectionState,
    pub status: DisplayStatus,
}

impl Snapshot {
    pub fn is_live(&self) -> bool {
        self.state == ConnectionState::Live
    }
}
