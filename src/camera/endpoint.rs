//! Process-wide camera endpoint store
//!
//! Single writer, many readers, last write wins. Readers copy the URL out so
//! in-flight pipeline runs keep the value they started with.

use std::sync::{Arc, PoisonError, RwLock};

use url::Url;

use crate::{Error, Result};

/// Shared handle to the configured camera stream URL
#[derive(Debug, Clone)]
pub struct EndpointStore {
    inner: Arc<RwLock<Option<String>>>,
    stream_port: u16,
    stream_path: String,
}

impl Default for EndpointStore {
    fn default() -> Self {
        Self::new(8080, "/video")
    }
}

impl EndpointStore {
    /// Create an empty store
    ///
    /// `stream_port` and `stream_path` are used by [`Self::set_from_ip`].
    #[must_use]
    pub fn new(stream_port: u16, stream_path: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            stream_port,
            stream_path: stream_path.into(),
        }
    }

    /// Replace the endpoint with a full stream URL
    ///
    /// # Errors
    ///
    /// Returns error if the URL is not a valid http(s) URL
    pub fn set(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| Error::Config(format!("invalid camera url {url:?}: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "camera url must be http or https, got {}",
                parsed.scheme()
            )));
        }

        let url = parsed.to_string();
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(url.clone());
        tracing::info!(endpoint = %url, "camera endpoint set");
        Ok(url)
    }

    /// Build `http://{ip}:{port}{path}` from a bare host and store it
    ///
    /// # Errors
    ///
    /// Returns error if the host does not form a valid URL
    pub fn set_from_ip(&self, ip: &str) -> Result<String> {
        let host = ip.trim();
        if host.is_empty() || host.contains('/') {
            return Err(Error::Config(format!("invalid camera host {ip:?}")));
        }
        let path = if self.stream_path.starts_with('/') {
            self.stream_path.clone()
        } else {
            format!("/{}", self.stream_path)
        };
        self.set(&format!("http://{host}:{}{path}", self.stream_port))
    }

    /// Current endpoint
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConfigured`] if no endpoint was ever set
    pub fn get(&self) -> Result<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotConfigured)
    }

    /// Whether an endpoint has been set
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_store_reports_not_configured() {
        let store = EndpointStore::default();
        assert!(matches!(store.get(), Err(Error::NotConfigured)));
        assert!(!store.is_configured());
    }

    #[test]
    fn ip_builds_stream_url() {
        let store = EndpointStore::default();
        let url = store.set_from_ip("192.168.1.5").unwrap();
        assert_eq!(url, "http://192.168.1.5:8080/video");
        assert_eq!(store.get().unwrap(), url);
    }

    #[test]
    fn last_write_wins_across_clones() {
        let store = EndpointStore::default();
        let reader = store.clone();

        store.set("http://10.0.0.1:8080/video").unwrap();
        store.set("http://10.0.0.2:8080/video").unwrap();

        assert_eq!(reader.get().unwrap(), "http://10.0.0.2:8080/video");
    }

    #[test]
    fn rejects_bad_urls() {
        let store = EndpointStore::default();
        assert!(store.set("not a url").is_err());
        assert!(store.set("ftp://10.0.0.1/video").is_err());
        assert!(store.set_from_ip("").is_err());
        assert!(store.set_from_ip("10.0.0.1/video").is_err());
        assert!(!store.is_configured());
    }

    #[test]
    fn custom_port_and_path() {
        let store = EndpointStore::new(4747, "mjpegfeed");
        let url = store.set_from_ip("10.1.1.1").unwrap();
        assert_eq!(url, "http://10.1.1.1:4747/mjpegfeed");
    }
}
