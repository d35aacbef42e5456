use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_STREAM_URL: &str = "http://127.0.0.1:8000/video/stream";

const CACHE_BUSTER_KEY: &str = "t";

static STREAM_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/stream(\?.*)?$").expect("stream suffix pattern"));

/// Appends `t=<millis>` so every assignment is a distinct request.
pub fn with_cache_buster(url: &str, millis: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{CACHE_BUSTER_KEY}={millis}")
}

pub fn cache_busted(url: &str) -> String {
    with_cache_buster(url, Utc::now().timestamp_millis())
}

/// Derives the health endpoint by swapping the trailing `/stream[?query]`
/// for `/status`. The query string does not survive the swap.
pub fn status_endpoint(stream_url: &str) -> Result<Url> {
    if !STREAM_SUFFIX.is_match(stream_url) {
        return Err(Error::StatusEndpoint(stream_url.to_string()));
    }
    let status_url = STREAM_SUFFIX.replace(stream_url, "/status");
    Url::parse(&status_url).map_err(|source| Error::InvalidUrl {
        url: status_url.to_string(),
        source,
    })
}
