use bytes::{Buf, BytesMut};
use reqwest::{Client, Response};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::sink::{FrameSink, SignalSender};

/// Bytes allowed between two frame boundaries before the stream is rejected.
pub const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Frame sink that fetches an MJPEG (or single JPEG) resource over HTTP and
/// reports `loaded` once the first complete image has arrived.
pub struct MjpegSink {
    client: Client,
    fetch: Option<JoinHandle<()>>,
}

impl MjpegSink {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            fetch: None,
        }
    }

    fn abort(&mut self) -> bool {
        match self.fetch.take() {
            Some(fetch) => {
                fetch.abort();
                true
            }
            None => false,
        }
    }
}

impl FrameSink for MjpegSink {
    fn set_source(&mut self, url: &str, signals: SignalSender) {
        self.abort();
        self.fetch = Some(tokio::spawn(watch_frames(
            self.client.clone(),
            url.to_string(),
            signals,
        )));
    }

    fn clear_source(&mut self) {
        if self.abort() {
            debug!("frame sink source cleared");
        }
    }
}

impl Drop for MjpegSink {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn open(client: &Client, url: &str) -> Result<Response> {
    Ok(client.get(url).send().await?.error_for_status()?)
}

async fn watch_frames(client: Client, url: String, signals: SignalSender) {
    let mut response = match open(&client, &url).await {
        Ok(response) => response,
        Err(e) => {
            debug!(%url, "frame sink load failed: {}", e);
            signals.failed();
            return;
        }
    };

    let mut scanner = FrameScanner::default();
    let mut frames = 0u64;
    loop {
        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                warn!(%url, frames, "frame stream interrupted: {}", e);
                break;
            }
        };

        match scanner.push(&chunk) {
            Ok(0) => {}
            Ok(n) => {
                if frames == 0 {
                    debug!(%url, "first frame received");
                    signals.loaded();
                }
                frames += n;
                trace!(frames, "frames received");
            }
            Err(buffered) => {
                warn!(%url, buffered, "no frame boundary within {} bytes", MAX_FRAME_BYTES);
                break;
            }
        }
    }

    if frames == 0 {
        signals.failed();
    } else {
        // Already reported loaded; the last frame stays on display.
        warn!(%url, frames, "frame stream ended");
    }
}

/// Counts complete JPEG images in a byte stream without keeping them.
#[derive(Debug, Default)]
pub(crate) struct FrameScanner {
    buf: BytesMut,
    in_frame: bool,
    since_boundary: usize,
}

impl FrameScanner {
    /// Returns the number of frames completed by `chunk`, or the number of
    /// bytes seen since the last boundary once that exceeds the limit.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> std::result::Result<u64, usize> {
        self.buf.extend_from_slice(chunk);

        let mut frames = 0;
        loop {
            let marker = if self.in_frame { EOI } else { SOI };
            match self.buf.windows(2).position(|w| w == marker) {
                Some(at) => {
                    self.buf.advance(at + 2);
                    if self.in_frame {
                        frames += 1;
                        self.since_boundary = 0;
                    } else {
                        self.since_boundary += at + 2;
                    }
                    self.in_frame = !self.in_frame;
                }
                None => {
                    // A trailing 0xFF may start a marker split across chunks.
                    let keep = usize::from(self.buf.last() == Some(&0xFF));
                    let consumed = self.buf.len() - keep;
                    self.buf.advance(consumed);
                    self.since_boundary += consumed;
                    break;
                }
            }
        }

        if self.since_boundary > MAX_FRAME_BYTES {
            return Err(self.since_boundary);
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(body: &[u8]) -> Vec<u8> {
        let mut frame = SOI.to_vec();
        frame.extend_from_slice(body);
        frame.extend_from_slice(&EOI);
        frame
    }

    fn part(body: &[u8]) -> Vec<u8> {
        let mut part = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        part.extend_from_slice(&jpeg(body));
        part.extend_from_slice(b"\r\n");
        part
    }

    #[test]
    fn test_single_frame() {
        let mut scanner = FrameScanner::default();
        assert_eq!(scanner.push(&part(b"abc")), Ok(1));
        assert_eq!(scanner.push(b"--frame\r\n"), Ok(0));
    }

    #[test]
    fn test_frames_in_one_chunk() {
        let mut scanner = FrameScanner::default();
        let mut chunk = part(b"one");
        chunk.extend(part(b"two"));
        chunk.extend(part(b"three"));
        assert_eq!(scanner.push(&chunk), Ok(3));
    }

    #[test]
    fn test_markers_split_across_chunks() {
        let mut scanner = FrameScanner::default();
        let frame = part(b"\x00\x01\x02");
        let soi = frame.iter().position(|b| *b == 0xFF).unwrap();
        let (head, tail) = frame.split_at(soi + 1);
        assert_eq!(scanner.push(head), Ok(0));

        let eoi = tail.len() - 3;
        let (middle, end) = tail.split_at(eoi);
        assert_eq!(scanner.push(middle), Ok(0));
        assert_eq!(scanner.push(end), Ok(1));
    }

    #[test]
    fn test_incomplete_frame() {
        let mut scanner = FrameScanner::default();
        assert_eq!(scanner.push(&SOI), Ok(0));
        assert_eq!(scanner.push(b"partial image data"), Ok(0));
    }

    #[test]
    fn test_no_boundary_overflows() {
        let mut scanner = FrameScanner::default();
        let noise = vec![0x55; MAX_FRAME_BYTES / 2 + 1];
        assert_eq!(scanner.push(&noise), Ok(0));
        assert!(scanner.push(&noise).is_err());
    }
}
