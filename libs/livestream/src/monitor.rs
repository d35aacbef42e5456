use reqwest::Client;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace};

use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::event::{Command, Event};
use crate::poller::StatusPoller;
use crate::retry::RetryScheduler;
use crate::session::StreamSession;
use crate::sink::FrameSink;
use crate::state::{ConnectionState, Snapshot, StatusWrite};

/// Event loop owning the session and the poller. Every state mutation
/// happens here, one event at a time.
pub struct Monitor<S> {
    session: StreamSession<S>,
    poller: StatusPoller,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedReceiver<Event>,
    snapshot: watch::Sender<Snapshot>,
}

/// Cloneable control surface for a running [`Monitor`]. The monitor shuts
/// down once every handle is dropped.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<Snapshot>,
}

impl<S: FrameSink> Monitor<S> {
    pub fn new(config: &StreamConfig, client: Client, sink: S) -> (Self, MonitorHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let session = StreamSession::new(
            config.url.clone(),
            sink,
            RetryScheduler::new(event_tx.clone()),
            config.retry_delay(),
            event_tx.clone(),
        );
        let poller = StatusPoller::new(config, client, event_tx);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

        let monitor = Self {
            session,
            poller,
            commands: command_rx,
            events: event_rx,
            snapshot: snapshot_tx,
        };
        let handle = MonitorHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
        };
        (monitor, handle)
    }

    pub async fn run(mut self) {
        info!(url = %self.session.target(), "monitor started");

        loop {
            let keep_running = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => false,
                },
                Some(event) = self.events.recv() => {
                    self.on_event(event);
                    true
                }
            };
            if !keep_running {
                break;
            }
            self.publish();
        }

        self.session.stop();
        self.poller.stop();
        self.publish();
        info!("monitor stopped");
    }

    fn on_command(&mut self, command: Command) -> bool {
        debug!(?command, "command");
        match command {
            Command::Start => {
                self.session.start();
                if let Some(write) = self.poller.start() {
                    self.session.apply(write);
                }
            }
            Command::Stop => {
                self.session.stop();
                self.poller.stop();
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn on_event(&mut self, event: Event) {
        match event {
            Event::Sink { attempt, signal } => self.session.on_sink_signal(attempt, signal),
            Event::RetryDue(token) => self.session.on_retry_due(token),
            Event::Health { epoch, health } => {
                if !self.poller.accepts(epoch)
                    || self.session.state() == ConnectionState::Stopped
                {
                    trace!(epoch, "discard stale health report");
                    return;
                }
                self.session.apply(StatusWrite::Health(health));
            }
        }
    }

    fn publish(&self) {
        let next = self.session.snapshot();
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug!(state = %next.state, status = %next.status, "snapshot");
            *current = next;
            true
        });
    }
}

impl MonitorHandle {
    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Stops the session and ends the monitor loop.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    pub fn snapshot(&self) -> Snapshot {
        *self.snapshot.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.clone()
    }

    /// Resolves with the first snapshot, current one included, matching `f`.
    pub async fn wait_for<F>(&self, mut f: F) -> Result<Snapshot>
    where
        F: FnMut(&Snapshot) -> bool,
    {
        let mut rx = self.subscribe();
        let snapshot = rx.wait_for(|s| f(s)).await.map_err(|_| Error::Closed)?;
        Ok(*snapshot)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::Closed)
    }
}
