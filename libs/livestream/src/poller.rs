use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::config::StreamConfig;
use crate::endpoint;
use crate::error::Result;
use crate::event::{Event, EventSender};
use crate::state::{HealthStatus, StatusWrite};

/// Periodically asks the publisher health endpoint why frames may be missing.
///
/// Each session start bumps the epoch; reports tagged with an older epoch
/// belong to a stopped session and must be discarded by the receiver.
pub struct StatusPoller {
    endpoint: std::result::Result<Url, String>,
    client: Client,
    interval: Duration,
    timeout: Duration,
    events: EventSender,
    task: Option<JoinHandle<()>>,
    epoch: u64,
    misconfig_reported: bool,
}

impl StatusPoller {
    pub(crate) fn new(config: &StreamConfig, client: Client, events: EventSender) -> Self {
        Self {
            endpoint: endpoint::status_endpoint(&config.url).map_err(|e| e.to_string()),
            client,
            interval: config.poll_interval().max(Duration::from_millis(1)),
            timeout: config.request_timeout(),
            events,
            task: None,
            epoch: 0,
            misconfig_reported: false,
        }
    }

    /// Starts polling unless already running. Returns the configuration
    /// error status the first time a bad endpoint prevents polling.
    pub fn start(&mut self) -> Option<StatusWrite> {
        if self.task.is_some() {
            return None;
        }

        let endpoint = match &self.endpoint {
            Ok(endpoint) => endpoint.clone(),
            Err(err) => {
                if self.misconfig_reported {
                    return None;
                }
                self.misconfig_reported = true;
                warn!("health polling disabled: {}", err);
                return Some(StatusWrite::Misconfigured);
            }
        };

        self.epoch += 1;
        info!(%endpoint, epoch = self.epoch, interval = ?self.interval, "health polling started");
        self.task = Some(tokio::spawn(poll_loop(
            self.client.clone(),
            endpoint,
            self.interval,
            self.timeout,
            self.epoch,
            self.events.clone(),
        )));
        None
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(epoch = self.epoch, "health polling stopped");
        }
        self.epoch += 1;
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Whether a report from `epoch` belongs to the running poll loop.
    pub fn accepts(&self, epoch: u64) -> bool {
        self.is_running() && epoch == self.epoch
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref().ok()
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn poll_loop(
    client: Client,
    endpoint: Url,
    period: Duration,
    timeout: Duration,
    epoch: u64,
    events: EventSender,
) {
    // First tick completes immediately.
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let client = client.clone();
        let endpoint = endpoint.clone();
        let events = events.clone();
        tokio::spawn(async move {
            match fetch_health(&client, endpoint, timeout).await {
                Ok(Some(health)) => {
                    trace!(?health, epoch, "health report");
                    let _ = events.send(Event::Health { epoch, health });
                }
                Ok(None) => {}
                Err(e) => debug!("health request failed: {}", e),
            }
        });
    }
}

/// `Ok(None)` when the endpoint answered with a non-success status.
pub async fn fetch_health(
    client: &Client,
    endpoint: Url,
    timeout: Duration,
) -> Result<Option<HealthStatus>> {
    let response = client
        .get(endpoint)
        .header(CACHE_CONTROL, "no-cache")
        .header(PRAGMA, "no-cache")
        .timeout(timeout)
        .send()
        .await?;

    if !response.status().is_success() {
        debug!(status = %response.status(), "health endpoint not ok");
        return Ok(None);
    }

    Ok(Some(response.json::<HealthStatus>().await?))
}
