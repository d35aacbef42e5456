#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use livestream::config::{PollInterval, RequestTimeout, RetryDelay};
use livestream::{MjpegSink, Monitor, MonitorHandle, Snapshot, StreamConfig};
use tokio::net::TcpListener;

const BOUNDARY: &str = "frame";

/// Stand-in for the video publisher server.
#[derive(Clone, Default)]
pub struct Publisher {
    inner: Arc<Mutex<PublisherState>>,
}

#[derive(Default)]
struct PublisherState {
    initialized: bool,
    has_frame: bool,
    status_code: Option<StatusCode>,
    stream_requests: usize,
    status_requests: usize,
}

impl Publisher {
    pub fn ready() -> Self {
        let publisher = Self::default();
        publisher.set(true, true);
        publisher
    }

    pub fn set(&self, initialized: bool, has_frame: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.initialized = initialized;
        inner.has_frame = has_frame;
    }

    /// Makes `/status` answer with `code` and no body.
    pub fn fail_status(&self, code: StatusCode) {
        self.inner.lock().unwrap().status_code = Some(code);
    }

    pub fn stream_requests(&self) -> usize {
        self.inner.lock().unwrap().stream_requests
    }

    pub fn status_requests(&self) -> usize {
        self.inner.lock().unwrap().status_requests
    }
}

async fn status(State(publisher): State<Publisher>) -> Response {
    let mut inner = publisher.inner.lock().unwrap();
    inner.status_requests += 1;
    if let Some(code) = inner.status_code {
        return code.into_response();
    }
    Json(serde_json::json!({
        "publisher_initialized": inner.initialized,
        "has_frame": inner.has_frame,
    }))
    .into_response()
}

async fn stream(State(publisher): State<Publisher>) -> Response {
    let ready = {
        let mut inner = publisher.inner.lock().unwrap();
        inner.stream_requests += 1;
        inner.initialized && inner.has_frame
    };
    if !ready {
        return (StatusCode::SERVICE_UNAVAILABLE, "No video frames available yet").into_response();
    }

    let mut body = Vec::new();
    for _ in 0..2 {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: 6\r\n\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(&[0xFF, 0xD8, 0x00, 0x11, 0xFF, 0xD9]);
        body.extend_from_slice(b"\r\n");
    }
    (
        [(
            header::CONTENT_TYPE,
            format!("multipart/x-mixed-replace; boundary={BOUNDARY}"),
        )],
        Body::from(body),
    )
        .into_response()
}

pub async fn serve(publisher: Publisher) -> SocketAddr {
    let listener = TcpListener::bind(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/video/status", get(status))
        .route("/video/stream", get(stream))
        .with_state(publisher);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0))
        .await
        .unwrap();
    listener.local_addr().unwrap()
}

pub fn stream_config(addr: SocketAddr, retry_delay: Duration) -> StreamConfig {
    let mut cfg = StreamConfig::new(format!("http://{addr}/video/stream"));
    cfg.retry_delay = RetryDelay(retry_delay.as_millis() as u64);
    cfg.poll_interval = PollInterval(100);
    cfg.request_timeout = RequestTimeout(500);
    cfg
}

pub fn spawn_monitor(cfg: &StreamConfig) -> MonitorHandle {
    let client = reqwest::Client::new();
    let (monitor, handle) = Monitor::new(cfg, client.clone(), MjpegSink::new(client));
    tokio::spawn(monitor.run());
    handle
}

pub async fn wait_for<F>(handle: &MonitorHandle, f: F) -> Snapshot
where
    F: FnMut(&Snapshot) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), handle.wait_for(f))
        .await
        .expect("snapshot not reached in time")
        .unwrap()
}
