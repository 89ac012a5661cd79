//! Pull-based frame source over HTTP
//!
//! Each fetch opens a fresh connection and decodes exactly one frame. Camera
//! apps usually serve either a single JPEG snapshot or an MJPEG
//! `multipart/x-mixed-replace` stream; for a stream only the first complete
//! JPEG is read before the connection is dropped.

use std::ops::Range;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::Frame;
use crate::config::CameraConfig;
use crate::{Error, Result};

/// Upper bound on bytes read while looking for one frame
pub const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

/// Source of single decoded frames from a stream endpoint
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Fetch and decode one fresh frame
    ///
    /// Implementations never retry; the caller owns retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamUnavailable`] on refusal, timeout, or malformed data
    async fn fetch(&self, endpoint: &str) -> Result<Frame>;
}

/// Frame source for HTTP snapshot and MJPEG endpoints
pub struct HttpFrameSource {
    client: reqwest::Client,
    connect_timeout: Duration,
    read_timeout: Duration,
    max_bytes: usize,
}

impl HttpFrameSource {
    /// Create a frame source with explicit timeouts
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            connect_timeout,
            read_timeout,
            max_bytes: MAX_FRAME_BYTES,
        })
    }

    /// Create a frame source from camera configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &CameraConfig) -> Result<Self> {
        Self::new(config.connect_timeout, config.read_timeout)
    }

    /// Override the byte cap used while searching for a frame
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn read_frame_bytes(
        &self,
        endpoint: &str,
        response: reqwest::Response,
        multipart: bool,
    ) -> Result<Vec<u8>> {
        let mut stream = response.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::stream(endpoint, e))?;
            buf.extend_from_slice(&chunk);

            if multipart && let Some(range) = find_jpeg(&buf) {
                buf.truncate(range.end);
                buf.drain(..range.start);
                return Ok(buf);
            }

            if buf.len() > self.max_bytes {
                return Err(Error::stream(
                    endpoint,
                    format!("no complete frame within {} bytes", self.max_bytes),
                ));
            }
        }

        if multipart {
            return find_jpeg(&buf)
                .map(|range| buf[range].to_vec())
                .ok_or_else(|| Error::stream(endpoint, "stream ended before a complete frame"));
        }

        if buf.is_empty() {
            return Err(Error::stream(endpoint, "empty response body"));
        }

        Ok(buf)
    }
}

#[async_trait]
impl FrameSource for HttpFrameSource {
    async fn fetch(&self, endpoint: &str) -> Result<Frame> {
        tracing::debug!(endpoint, "fetching frame");

        let response = tokio::time::timeout(
            self.connect_timeout + self.read_timeout,
            self.client.get(endpoint).send(),
        )
        .await
        .map_err(|_| Error::stream(endpoint, "timed out waiting for response"))?
        .map_err(|e| Error::stream(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::stream(endpoint, format!("camera returned {status}")));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let multipart = content_type.starts_with("multipart/");

        let bytes = tokio::time::timeout(
            self.read_timeout,
            self.read_frame_bytes(endpoint, response, multipart),
        )
        .await
        .map_err(|_| Error::stream(endpoint, "timed out reading frame"))??;

        let frame = tokio::task::spawn_blocking(move || Frame::decode(&bytes))
            .await
            .map_err(|e| Error::stream(endpoint, e))?
            .map_err(|e| Error::stream(endpoint, e))?;

        tracing::debug!(
            endpoint,
            width = frame.width(),
            height = frame.height(),
            "frame decoded"
        );
        Ok(frame)
    }
}

/// Outcome of walking one JPEG from its SOI marker
enum Walk {
    Complete(usize),
    Incomplete,
    Malformed,
}

/// Locate the first complete JPEG image in a byte buffer
///
/// Walks marker segments so that embedded thumbnails do not end the image early.
#[must_use]
pub fn find_jpeg(buf: &[u8]) -> Option<Range<usize>> {
    let mut from = 0;
    while let Some(offset) = buf[from..].windows(2).position(|w| w == [0xFF, 0xD8]) {
        let start = from + offset;
        match walk_jpeg(buf, start) {
            Walk::Complete(end) => return Some(start..end),
            Walk::Incomplete => return None,
            Walk::Malformed => from = start + 2,
        }
    }
    None
}

fn walk_jpeg(buf: &[u8], start: usize) -> Walk {
    let len = buf.len();
    let mut i = start + 2;

    loop {
        if i + 1 >= len {
            return Walk::Incomplete;
        }
        if buf[i] != 0xFF {
            return Walk::Malformed;
        }

        match buf[i + 1] {
            // Fill byte before a marker
            0xFF => i += 1,
            0xD9 => return Walk::Complete(i + 2),
            0x01 | 0xD0..=0xD8 => i += 2,
            marker => {
                if i + 3 >= len {
                    return Walk::Incomplete;
                }
                let seg_len = usize::from(u16::from_be_bytes([buf[i + 2], buf[i + 3]]));
                if seg_len < 2 {
                    return Walk::Malformed;
                }
                i += 2 + seg_len;

                if marker == 0xDA {
                    // Entropy-coded data runs until the next real marker
                    loop {
                        if i + 1 >= len {
                            return Walk::Incomplete;
                        }
                        if buf[i] == 0xFF {
                            match buf[i + 1] {
                                0x00 | 0xD0..=0xD7 => i += 2,
                                0xFF => i += 1,
                                _ => break,
                            }
                        } else {
                            i += 1;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
        out.into_inner()
    }

    #[test]
    fn finds_jpeg_inside_multipart_noise() {
        let image = jpeg(8, 8);
        let mut body = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        let start = body.len();
        body.extend_from_slice(&image);
        body.extend_from_slice(b"\r\n--frame\r\n");

        let range = find_jpeg(&body).unwrap();
        assert_eq!(range, start..start + image.len());
    }

    #[test]
    fn partial_jpeg_is_incomplete() {
        let image = jpeg(8, 8);
        let half = &image[..image.len() / 2];
        assert!(find_jpeg(half).is_none());
    }

    #[test]
    fn skips_stray_soi_bytes() {
        let image = jpeg(4, 4);
        let mut body = vec![0xFF, 0xD8, 0x12, 0x34];
        let start = body.len();
        body.extend_from_slice(&image);

        let range = find_jpeg(&body).unwrap();
        assert_eq!(range.start, start);
        assert!(Frame::decode(&body[range]).is_ok());
    }

    #[test]
    fn no_soi_means_no_frame() {
        assert!(find_jpeg(b"--frame\r\n\r\nhello").is_none());
        assert!(find_jpeg(&[]).is_none());
    }
}
