// * Page Source - where the live document comes from
// * The pipeline reads the current page through this seam; it never mutates it during discovery.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Page navigation failed: {0}")]
    Navigation(String),

    #[error("Page timeout after {0}ms")]
    Timeout(u64),

    #[error("No element matched any of: {0}")]
    ElementNotFound(String),

    #[error("Operation not supported by this page source: {0}")]
    Unsupported(&'static str),
}

/// The document as it was when read: location plus serialized markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Type alias for page source futures
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Access to the operator's page
pub trait PageSource: Send + Sync {
    /// Reads the current location and markup
    fn snapshot(&self) -> SourceFuture<'_, PageSnapshot>;

    /// Sends the operator's view to `url`. Fire-and-forget: the run ends afterwards.
    fn navigate<'a>(&'a self, url: &'a str) -> SourceFuture<'a, ()>;

    /// Description text of an item's detail view, when the source can open one
    fn detail_text<'a>(&'a self, _reference: &'a str) -> SourceFuture<'a, Option<String>> {
        Box::pin(async { Ok(None) })
    }

    /// One-shot paste of `text` into the item's answer field
    fn paste<'a>(&'a self, _reference: &'a str, _text: &'a str) -> SourceFuture<'a, ()> {
        Box::pin(async { Err(SourceError::Unsupported("paste")) })
    }
}

/// A saved snapshot. Navigation requests are recorded instead of performed.
#[derive(Debug)]
pub struct StaticPageSource {
    snapshot: PageSnapshot,
    details: HashMap<String, String>,
    redirects: Mutex<Vec<String>>,
}

impl StaticPageSource {
    pub fn new(snapshot: PageSnapshot) -> Self {
        Self {
            snapshot,
            details: HashMap::new(),
            redirects: Mutex::new(Vec::new()),
        }
    }

    /// Loads markup saved from the browser (e.g. "Save page as...")
    pub fn from_file(path: &Path, url: impl Into<String>) -> Result<Self, SourceError> {
        let html = std::fs::read_to_string(path)?;
        Ok(Self::new(PageSnapshot::new(url, html)))
    }

    /// Registers detail text served for `reference`
    pub fn with_detail(mut self, reference: impl Into<String>, text: impl Into<String>) -> Self {
        self.details.insert(reference.into(), text.into());
        self
    }

    /// Targets of every navigation requested so far
    pub fn redirects(&self) -> Vec<String> {
        self.redirects
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl PageSource for StaticPageSource {
    fn snapshot(&self) -> SourceFuture<'_, PageSnapshot> {
        let snapshot = self.snapshot.clone();
        Box::pin(async move { Ok(snapshot) })
    }

    fn navigate<'a>(&'a self, url: &'a str) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            if let Ok(mut redirects) = self.redirects.lock() {
                redirects.push(url.to_string());
            }
            Ok(())
        })
    }

    fn detail_text<'a>(&'a self, reference: &'a str) -> SourceFuture<'a, Option<String>> {
        let text = self.details.get(reference).cloned();
        Box::pin(async move { Ok(text) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_static_source_serves_snapshot() {
        let source = StaticPageSource::new(PageSnapshot::new("https://x.test/a", "<p>hi</p>"));
        let snap = source.snapshot().await.unwrap();
        assert_eq!(snap.url, "https://x.test/a");
        assert_eq!(snap.html, "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_static_source_records_redirects() {
        let source = StaticPageSource::new(PageSnapshot::new("https://x.test/", ""));
        source.navigate("https://x.test/list").await.unwrap();
        assert_eq!(source.redirects(), vec!["https://x.test/list".to_string()]);
    }

    #[tokio::test]
    async fn test_static_source_detail_and_paste() {
        let source = StaticPageSource::new(PageSnapshot::new("https://x.test/", ""))
            .with_detail("https://x.test/c/1/a/2", "Read chapter 5");
        assert_eq!(
            source.detail_text("https://x.test/c/1/a/2").await.unwrap().as_deref(),
            Some("Read chapter 5")
        );
        assert_eq!(source.detail_text("https://x.test/other").await.unwrap(), None);
        assert!(matches!(
            source.paste("https://x.test/c/1/a/2", "text").await,
            Err(SourceError::Unsupported("paste"))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "<html><body>saved</body></html>").unwrap();
        let source = StaticPageSource::from_file(file.path(), "https://x.test/").unwrap();
        assert!(source.snapshot.html.contains("saved"));
    }
}
