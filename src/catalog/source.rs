use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Where the raw catalog bytes come from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Human-readable location used in logs and snapshot summaries
    fn location(&self) -> String;

    async fn fetch(&self) -> Result<Vec<u8>>;
}

pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|source| CatalogError::Io {
            location: self.location(),
            source,
        })
    }
}

pub struct HttpCatalogSource {
    url: String,
    client: reqwest::Client,
}

impl HttpCatalogSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| CatalogError::Http {
                location: url.clone(),
                source,
            })?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    fn location(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        let http_error = |source| CatalogError::Http {
            location: self.url.clone(),
            source,
        };

        let resp = self.client.get(&self.url).send().await.map_err(http_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                location: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = resp.bytes().await.map_err(http_error)?.to_vec();
        debug!(url = %self.url, content_type = %content_type, bytes = bytes.len(), "Fetched catalog");
        Ok(bytes)
    }
}

/// Pick a source from a configured location: `http(s)://` URLs are fetched, anything else is a file path.
pub fn source_for_location(location: &str) -> Result<Box<dyn CatalogSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpCatalogSource::new(location)?))
    } else {
        Ok(Box::new(FileCatalogSource::new(location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source_reads_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[]").unwrap();

        let source = FileCatalogSource::new(file.path());
        assert_eq!(source.fetch().await.unwrap(), b"[]".to_vec());
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let source = FileCatalogSource::new("/definitely/not/here/catalog.json");
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_location_selects_source_kind() {
        let remote = source_for_location("https://example.org/c.json").unwrap();
        assert_eq!(remote.location(), "https://example.org/c.json");
        assert_eq!(source_for_location("data/c.json").unwrap().location(), "data/c.json");
    }

    #[tokio::test]
    async fn test_http_source_reports_connection_failure() {
        // Port 9 (discard) is not expected to serve HTTP locally
        let source = HttpCatalogSource::new("http://127.0.0.1:9/catalog.json").unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, CatalogError::Http { .. }));
    }
}
