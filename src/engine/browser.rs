// * Browser Page Source - the operator's live, authenticated Chrome session
// * Attaches over the DevTools protocol (ChromiumOxide). Signing in is the operator's job;
// * this module only reads the active tab and opens short-lived tabs for detail/paste work.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::constants::{DETAIL_TIMEOUT_MS, PASTE_TIMEOUT_MS, TAB_CLOSE_RESERVE_MS};
use crate::engine::page_source::{PageSnapshot, PageSource, SourceError, SourceFuture};
use crate::extractor::detail::extract_detail_description;

// * Answer-field candidates on a detail page, tried in order
const EDITOR_SELECTORS: &[&str] = &[
    r#"[contenteditable="true"]"#,
    r#"div[role="textbox"]"#,
    "textarea",
];

// * Buttons that reveal the answer field when it is collapsed
const ADD_WORK_SELECTORS: &[&str] = &[
    r#"[aria-label="Add or create"]"#,
    r#"[data-guidedhelpid="assignmentAddWorkButton"]"#,
];

// * Host whose tabs are preferred when several are open
const TARGET_HOST: &str = "classroom.google.com";

// * BrowserPageSource drives an already running (or freshly launched) Chrome
pub struct BrowserPageSource {
    browser: Browser,
    handler: Option<tokio::task::JoinHandle<()>>,
    settle_delay: Duration,
    detail_timeout: Duration,
    paste_timeout: Duration,
}

impl BrowserPageSource {
    // * Attaches to a Chrome started with --remote-debugging-port (ws://127.0.0.1:9222/devtools/browser/...)
    pub async fn connect(ws_url: &str, settle_delay: Duration) -> Result<Self, SourceError> {
        let (browser, handler) = Browser::connect(ws_url)
            .await
            .map_err(|e| SourceError::Browser(e.to_string()))?;

        info!(ws_url, "Attached to running browser");
        Ok(Self::with_handler(browser, handler, settle_delay))
    }

    // * Launches a headed Chrome on a persistent profile so an earlier sign-in is reused
    pub async fn launch(user_data_dir: &Path, settle_delay: Duration) -> Result<Self, SourceError> {
        let config = BrowserConfig::builder()
            .with_head()
            .user_data_dir(user_data_dir)
            .viewport(None)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(SourceError::Browser)?;

        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| SourceError::Browser(e.to_string()))?;

        info!(profile = %user_data_dir.display(), "Browser launched");
        Ok(Self::with_handler(browser, handler, settle_delay))
    }

    fn with_handler(
        browser: Browser,
        mut handler: chromiumoxide::Handler,
        settle_delay: Duration,
    ) -> Self {
        // * Spawn handler in background
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        Self {
            browser,
            handler: Some(handle),
            settle_delay,
            detail_timeout: Duration::from_millis(DETAIL_TIMEOUT_MS),
            paste_timeout: Duration::from_millis(PASTE_TIMEOUT_MS),
        }
    }

    /// Ceilings for the short-lived detail and paste tabs
    pub fn with_tab_timeouts(mut self, detail: Duration, paste: Duration) -> Self {
        self.detail_timeout = detail;
        self.paste_timeout = paste;
        self
    }

    // * The tab the operator is looking at: first tab on the target host, else the first tab
    async fn active_page(&self) -> Result<Page, SourceError> {
        let pages = self
            .browser
            .pages()
            .await
            .map_err(|e| SourceError::Browser(e.to_string()))?;

        let mut fallback = None;
        for page in pages {
            let url = page.url().await.ok().flatten().unwrap_or_default();
            if url.contains(TARGET_HOST) {
                return Ok(page);
            }
            if fallback.is_none() {
                fallback = Some(page);
            }
        }

        fallback.ok_or_else(|| SourceError::Browser("no open tabs".to_string()))
    }

    // * Opens `url` in a fresh tab and waits the settle delay
    async fn open(&self, url: &str) -> Result<Page, SourceError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| SourceError::Navigation(e.to_string()))?;

        tokio::time::sleep(self.settle_delay).await;
        Ok(page)
    }

    async fn read_detail(&self, reference: &str) -> Result<Option<String>, SourceError> {
        let started = Instant::now();
        let page = self.open(reference).await?;
        let budget = tab_budget(self.detail_timeout, started.elapsed());

        let closing = page.clone();
        let html = bounded_then_close(
            budget,
            async { page.content().await.map_err(|e| SourceError::Browser(e.to_string())) },
            || async move {
                let _ = closing.close().await;
            },
        )
        .await?;

        Ok(extract_detail_description(&html))
    }

    async fn paste_into(&self, reference: &str, text: &str) -> Result<(), SourceError> {
        let started = Instant::now();
        let page = self.open(reference).await?;
        let budget = tab_budget(self.paste_timeout, started.elapsed());

        let closing = page.clone();
        bounded_then_close(
            budget,
            Self::type_into_editor(&page, text, self.settle_delay),
            || async move {
                let _ = closing.close().await;
            },
        )
        .await
    }

    async fn type_into_editor(page: &Page, text: &str, settle: Duration) -> Result<(), SourceError> {
        // * Reveal the answer field if a button hides it
        for selector in ADD_WORK_SELECTORS {
            if let Ok(button) = page.find_element(*selector).await {
                if button.click().await.is_ok() {
                    tokio::time::sleep(settle / 2).await;
                    break;
                }
            }
        }

        let mut editor = None;
        for selector in EDITOR_SELECTORS {
            if let Ok(element) = page.find_element(*selector).await {
                editor = Some(element);
                break;
            }
        }
        let editor =
            editor.ok_or_else(|| SourceError::ElementNotFound(EDITOR_SELECTORS.join(", ")))?;

        editor
            .click()
            .await
            .map_err(|e| SourceError::Browser(e.to_string()))?;

        let lines: Vec<&str> = text.split('\n').collect();
        for (i, line) in lines.iter().enumerate() {
            editor
                .type_str(*line)
                .await
                .map_err(|e| SourceError::Browser(e.to_string()))?;
            if i + 1 < lines.len() {
                editor
                    .press_key("Enter")
                    .await
                    .map_err(|e| SourceError::Browser(e.to_string()))?;
            }
        }

        Ok(())
    }

    // * Detaches from the browser. A connected (operator-owned) browser keeps running.
    pub async fn shutdown(mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        info!("Browser page source shut down");
    }
}

// * Time left for tab work once the tab is open, minus what closing it needs
fn tab_budget(limit: Duration, elapsed: Duration) -> Duration {
    limit
        .saturating_sub(Duration::from_millis(TAB_CLOSE_RESERVE_MS))
        .saturating_sub(elapsed)
}

// * Runs `work` under `limit`, then runs `close` whatever the outcome
async fn bounded_then_close<T, W, C, CF>(limit: Duration, work: W, close: C) -> Result<T, SourceError>
where
    W: Future<Output = Result<T, SourceError>>,
    C: FnOnce() -> CF,
    CF: Future<Output = ()>,
{
    let result = tokio::time::timeout(limit, work).await;
    close().await;
    result.unwrap_or_else(|_| Err(SourceError::Timeout(limit.as_millis() as u64)))
}

impl PageSource for BrowserPageSource {
    fn snapshot(&self) -> SourceFuture<'_, PageSnapshot> {
        Box::pin(async move {
            let page = self.active_page().await?;
            let url = page
                .url()
                .await
                .map_err(|e| SourceError::Browser(e.to_string()))?
                .unwrap_or_default();
            let html = page
                .content()
                .await
                .map_err(|e| SourceError::Browser(e.to_string()))?;

            debug!(url = %url, bytes = html.len(), "Snapshot captured");
            Ok(PageSnapshot { url, html })
        })
    }

    fn navigate<'a>(&'a self, url: &'a str) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            let page = self.active_page().await?;
            page.goto(url)
                .await
                .map_err(|e| SourceError::Navigation(e.to_string()))?;
            Ok(())
        })
    }

    fn detail_text<'a>(&'a self, reference: &'a str) -> SourceFuture<'a, Option<String>> {
        Box::pin(self.read_detail(reference))
    }

    fn paste<'a>(&'a self, reference: &'a str, text: &'a str) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            let result = self.paste_into(reference, text).await;
            if let Err(e) = &result {
                warn!(reference, error = %e, "Paste failed");
            }
            result
        })
    }
}

impl Drop for BrowserPageSource {
    fn drop(&mut self) {
        // * Best effort cleanup - can't await in drop
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_stalled_tab_work_still_closes() {
        let closed = Arc::new(AtomicBool::new(false));
        let flag = closed.clone();

        let result: Result<(), SourceError> = bounded_then_close(
            Duration::from_millis(20),
            futures::future::pending(),
            || async move {
                flag.store(true, Ordering::SeqCst);
            },
        )
        .await;

        assert!(matches!(result, Err(SourceError::Timeout(20))));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failed_tab_work_closes_and_keeps_the_error() {
        let closed = Arc::new(AtomicBool::new(false));
        let flag = closed.clone();

        let result: Result<(), SourceError> = bounded_then_close(
            Duration::from_secs(1),
            async { Err(SourceError::ElementNotFound("textarea".into())) },
            || async move {
                flag.store(true, Ordering::SeqCst);
            },
        )
        .await;

        assert!(matches!(result, Err(SourceError::ElementNotFound(_))));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_tab_budget_ends_before_the_callers_ceiling() {
        let limit = Duration::from_millis(DETAIL_TIMEOUT_MS);
        let budget = tab_budget(limit, Duration::from_secs(3));
        assert_eq!(budget, limit - Duration::from_millis(TAB_CLOSE_RESERVE_MS) - Duration::from_secs(3));
        assert_eq!(tab_budget(Duration::from_secs(1), Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn test_editor_selectors_cover_rich_and_plain_fields() {
        assert!(EDITOR_SELECTORS.iter().any(|s| s.contains("contenteditable")));
        assert!(EDITOR_SELECTORS.contains(&"textarea"));
    }

    #[test]
    fn test_selectors_are_valid_css() {
        for selector in EDITOR_SELECTORS.iter().chain(ADD_WORK_SELECTORS) {
            assert!(scraper::Selector::parse(selector).is_ok(), "{selector}");
        }
    }
}
