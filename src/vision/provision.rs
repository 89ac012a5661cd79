//! Model file provisioning
//!
//! Downloads the detection model on first run. The file is streamed into a
//! temporary sibling and renamed into place, so a partial download never
//! leaves a corrupt model behind.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;

use crate::{Error, Result};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Make sure the model exists at `path`, downloading from `url` if not
///
/// # Errors
///
/// Returns [`Error::ModelProvisioning`] if the download or write fails
pub async fn ensure_model(path: &Path, url: &str) -> Result<PathBuf> {
    if std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0) {
        tracing::debug!(path = %path.display(), "model already present");
        return Ok(path.to_path_buf());
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::ModelProvisioning(format!("create {}: {e}", dir.display())))?;

    tracing::info!(url, path = %path.display(), "downloading model");

    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| Error::ModelProvisioning(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::ModelProvisioning(format!("request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::ModelProvisioning(format!(
            "{url} returned {}; set SIGHTLINE_MODEL_URL to a YOLOv8 ONNX export \
             or place one at {}",
            response.status(),
            path.display()
        )));
    }

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| Error::ModelProvisioning(e.to_string()))?;
    let mut written = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::ModelProvisioning(format!("download failed: {e}")))?;
        file.write_all(&chunk)
            .map_err(|e| Error::ModelProvisioning(e.to_string()))?;
        written += chunk.len() as u64;
    }

    if written == 0 {
        return Err(Error::ModelProvisioning("downloaded model is empty".to_string()));
    }

    file.flush()
        .map_err(|e| Error::ModelProvisioning(e.to_string()))?;
    file.persist(path)
        .map_err(|e| Error::ModelProvisioning(e.error.to_string()))?;

    tracing::info!(path = %path.display(), bytes = written, "model downloaded");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn existing_model_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"onnx").unwrap();

        // Unroutable URL: any network attempt would fail
        let out = ensure_model(&path, "http://127.0.0.1:9/model.onnx")
            .await
            .unwrap();
        assert_eq!(out, path);
    }

    #[tokio::test]
    async fn unreachable_source_is_a_provisioning_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("model.onnx");

        let err = ensure_model(&path, "http://127.0.0.1:9/model.onnx")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ModelProvisioning(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_artifact_names_the_override() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, axum::Router::new()).await;
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yolov8n.onnx");
        let url = format!("http://{addr}/yolov8n.onnx");

        let Error::ModelProvisioning(message) = ensure_model(&path, &url).await.unwrap_err()
        else {
            panic!("expected a provisioning error");
        };
        assert!(message.contains("404"), "{message}");
        assert!(message.contains("SIGHTLINE_MODEL_URL"), "{message}");
        assert!(message.contains(&url), "{message}");
        assert!(!path.exists());
    }
}
