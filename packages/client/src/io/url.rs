//! URL resource access

use std::fs::File;
use std::io::{BufReader, Read};
use std::time::Duration;

use url::Url;

use crate::error::{CertError, Result};

/// Opens a readable stream for a URL.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &Url) -> Result<Box<dyn Read>>;
}

/// Handles `file:` URLs; every other scheme is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileUrlOpener;

impl UrlOpener for FileUrlOpener {
    fn open(&self, url: &Url) -> Result<Box<dyn Read>> {
        if url.scheme() != "file" {
            return Err(CertError::invalid_argument(format!(
                "unsupported URL scheme '{}' in {url}",
                url.scheme()
            )));
        }
        let path = url
            .to_file_path()
            .map_err(|()| CertError::invalid_argument(format!("not a local file URL: {url}")))?;

        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Fetches `http:` and `https:` URLs with a blocking client.
///
/// Must not be called from within an async runtime.
#[derive(Debug, Clone, Copy)]
pub struct HttpUrlOpener {
    timeout: Duration,
}

impl HttpUrlOpener {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl UrlOpener for HttpUrlOpener {
    fn open(&self, url: &Url) -> Result<Box<dyn Read>> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CertError::invalid_argument(format!("not an HTTP URL: {url}")));
        }
        let client = reqwest::blocking::Client::builder().timeout(self.timeout).build()?;
        let response = client.get(url.as_str()).send()?.error_for_status()?;

        tracing::debug!("Fetched {} ({})", url, response.status());
        Ok(Box::new(response))
    }
}

/// Selects the opener by URL scheme: `file`, `http` and `https`.
#[derive(Debug, Clone, Copy)]
pub struct SchemeUrlOpener {
    http: HttpUrlOpener,
}

impl SchemeUrlOpener {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: HttpUrlOpener::new(timeout),
        }
    }

    #[must_use]
    pub fn supports(url: &Url) -> bool {
        matches!(url.scheme(), "file" | "http" | "https")
    }
}

impl UrlOpener for SchemeUrlOpener {
    fn open(&self, url: &Url) -> Result<Box<dyn Read>> {
        match url.scheme() {
            "file" => FileUrlOpener.open(url),
            "http" | "https" => self.http.open(url),
            scheme => Err(CertError::invalid_argument(format!(
                "unsupported URL scheme '{scheme}' in {url}"
            ))),
        }
    }
}

/// Last path segment of a URL, used to bias reader selection.
#[must_use]
pub fn url_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back().map(ToString::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_file_name() {
        let url = Url::parse("https://example.org/certs/chain.pem").unwrap();
        assert_eq!(url_file_name(&url), "chain.pem");

        let url = Url::parse("https://example.org/").unwrap();
        assert_eq!(url_file_name(&url), "");
    }

    #[test]
    fn test_rejects_other_schemes() {
        let url = Url::parse("https://example.org/chain.pem").unwrap();
        assert!(FileUrlOpener.open(&url).is_err());

        let url = Url::parse("ftp://example.org/chain.pem").unwrap();
        assert!(!SchemeUrlOpener::supports(&url));
        assert!(matches!(
            SchemeUrlOpener::new(Duration::from_secs(1)).open(&url),
            Err(CertError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_scheme_opener_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.pem");
        std::fs::write(&path, b"content").unwrap();

        let url = Url::from_file_path(&path).unwrap();
        let mut data = String::new();
        SchemeUrlOpener::new(Duration::from_secs(1))
            .open(&url)
            .unwrap()
            .read_to_string(&mut data)
            .unwrap();

        assert_eq!(data, "content");
    }
}
