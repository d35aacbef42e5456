//! Connection manager for a live MJPEG stream.
//!
//! A [`Monitor`] attaches the stream to a [`FrameSink`], retries on failure
//! and polls the publisher health endpoint, exposing the outcome as a
//! [`Snapshot`] through its [`MonitorHandle`].

pub mod config;
pub mod endpoint;
pub mod error;
mod event;
pub mod mjpeg;
pub mod monitor;
pub mod poller;
pub mod retry;
pub mod session;
pub mod sink;
pub mod state;

pub use config::StreamConfig;
pub use error::{Error, Result};
pub use mjpeg::MjpegSink;
pub use monitor::{Monitor, MonitorHandle};
pub use sink::{AttemptId, FrameSink, SignalSender, SinkSignal};
pub use state::{ConnectionState, DisplayStatus, HealthStatus, Snapshot};
