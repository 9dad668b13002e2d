//! Browser capability (§4.E): the thin surface the Map Parser's scroll-driving
//! orchestrator and any JS-rendered fetch path depend on. Grounded on
//! `browser_setup.rs` (launch/stealth) and `kromekover` (evasion injection).

use std::time::{Duration, Instant};

use anyhow::Result;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::browser_setup::launch_browser_with_proxy;

/// Outcome of a [`BrowserCapability::navigate`] call.
#[derive(Debug, Clone)]
pub struct NavigateOutcome {
    pub ok: bool,
    pub body: String,
    pub final_url: String,
    pub status: Option<u16>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// Returns as soon as `navigate` resolves, without an extra settle wait.
    DomContentLoaded,
    /// Waits for the page's load event before returning.
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Attached,
    Visible,
}

/// Capability surface the extraction pipeline drives the browser through.
/// The core assumes a single navigable surface and injects no
/// language-specific hooks into the implementation.
pub trait BrowserCapability {
    fn navigate(
        &self,
        url: &str,
        wait: WaitCondition,
    ) -> impl std::future::Future<Output = Result<NavigateOutcome>> + Send;

    fn wait_for_selector(
        &self,
        selector: &str,
        state: ElementState,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn scroll_within(
        &self,
        selector: &str,
        pause: Duration,
        max_scrolls: u32,
    ) -> impl std::future::Future<Output = Result<u32>> + Send;

    fn scroll_to_bottom(
        &self,
        pause: Duration,
        max_scrolls: u32,
    ) -> impl std::future::Future<Output = Result<u32>> + Send;

    fn click(&self, selector: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    fn evaluate(&self, script: &str) -> impl std::future::Future<Output = Result<serde_json::Value>> + Send;

    fn content(&self) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Requests per identity before the context is re-created (§4.E).
const ROTATE_EVERY: u32 = 10;

/// `chromiumoxide`-backed implementation of [`BrowserCapability`].
///
/// Holds a single current `Page`; every `ROTATE_EVERY`th navigation closes it
/// and opens a fresh one with a new stealth injection, approximating the
/// "new identity, new proxy" context rotation (proxy selection happens one
/// layer up, at browser launch, since chromiumoxide binds the proxy to the
/// whole browser process rather than per-tab).
pub struct ChromeBrowser {
    browser: chromiumoxide::Browser,
    _handler: JoinHandle<()>,
    page: tokio::sync::Mutex<Page>,
    request_count: std::sync::atomic::AtomicU32,
    headless: bool,
}

impl ChromeBrowser {
    pub async fn launch(headless: bool) -> Result<Self> {
        Self::launch_with_proxy(headless, None).await
    }

    pub async fn launch_with_proxy(headless: bool, proxy_url: Option<&str>) -> Result<Self> {
        let (browser, handler, _data_dir) = launch_browser_with_proxy(headless, None, proxy_url).await?;
        let page = browser.new_page("about:blank").await?;
        crate::kromekover::inject(page.clone()).await?;
        Ok(Self {
            browser,
            _handler: handler,
            page: tokio::sync::Mutex::new(page),
            request_count: std::sync::atomic::AtomicU32::new(0),
            headless,
        })
    }

    async fn rotate_if_due(&self) -> Result<()> {
        let count = self.request_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        if count % ROTATE_EVERY != 0 {
            return Ok(());
        }
        debug!("rotating browser identity after {count} requests");
        let new_page = self.browser.new_page("about:blank").await?;
        crate::kromekover::inject(new_page.clone()).await?;
        let mut guard = self.page.lock().await;
        let old = std::mem::replace(&mut *guard, new_page);
        drop(old.close().await);
        Ok(())
    }
}

impl BrowserCapability for ChromeBrowser {
    async fn navigate(&self, url: &str, wait: WaitCondition) -> Result<NavigateOutcome> {
        self.rotate_if_due().await?;
        let started = Instant::now();
        let guard = self.page.lock().await;
        let params = NavigateParams::builder().url(url).build().map_err(|e| anyhow::anyhow!(e))?;
        let nav_result = guard.goto(params).await;
        let ok = nav_result.is_ok();
        if ok && matches!(wait, WaitCondition::Load) {
            let _ = guard.wait_for_navigation().await;
        }
        let final_url = guard.url().await.ok().flatten().unwrap_or_else(|| url.to_string());
        let body = guard.content().await.unwrap_or_default();
        info!(url, ok, "browser navigate");
        Ok(NavigateOutcome { ok, body, final_url, status: None, elapsed: started.elapsed() })
    }

    async fn wait_for_selector(&self, selector: &str, state: ElementState, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let guard = self.page.lock().await;
        loop {
            let found = guard.find_element(selector).await.is_ok();
            let satisfied = match state {
                ElementState::Attached => found,
                ElementState::Visible => {
                    if !found {
                        false
                    } else {
                        let script = format!(
                            "(() => {{ const el = document.querySelector({selector:?}); if (!el) return false; const r = el.getBoundingClientRect(); return r.width > 0 && r.height > 0; }})()"
                        );
                        guard.evaluate(script).await.ok().and_then(|r| r.into_value::<bool>().ok()).unwrap_or(false)
                    }
                }
            };
            if satisfied {
                return Ok(());
            }
            if Instant::now() >= deadline {
                anyhow::bail!("timed out waiting for selector {selector}");
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    async fn scroll_within(&self, selector: &str, pause: Duration, max_scrolls: u32) -> Result<u32> {
        let guard = self.page.lock().await;
        let mut scrolls = 0;
        let mut last_height = -1.0_f64;
        while scrolls < max_scrolls {
            let script = format!(
                "(() => {{ const el = document.querySelector({selector:?}); if (!el) return -1; el.scrollTop = el.scrollHeight; return el.scrollHeight; }})()"
            );
            let height: f64 = guard.evaluate(script).await?.into_value()?;
            if height < 0.0 || (height - last_height).abs() < 1.0 {
                break;
            }
            last_height = height;
            scrolls += 1;
            tokio::time::sleep(pause).await;
        }
        Ok(scrolls)
    }

    async fn scroll_to_bottom(&self, pause: Duration, max_scrolls: u32) -> Result<u32> {
        let guard = self.page.lock().await;
        let mut scrolls = 0;
        let mut last_height = -1.0_f64;
        while scrolls < max_scrolls {
            let height: f64 = guard
                .evaluate("(() => { window.scrollTo(0, document.body.scrollHeight); return document.body.scrollHeight; })()")
                .await?
                .into_value()?;
            if (height - last_height).abs() < 1.0 {
                break;
            }
            last_height = height;
            scrolls += 1;
            tokio::time::sleep(pause).await;
        }
        Ok(scrolls)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let guard = self.page.lock().await;
        let element = guard.find_element(selector).await?;
        element.click().await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let guard = self.page.lock().await;
        Ok(guard.evaluate(script).await?.into_value()?)
    }

    async fn content(&self) -> Result<String> {
        let guard = self.page.lock().await;
        Ok(guard.content().await?)
    }
}

impl std::fmt::Debug for ChromeBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromeBrowser").field("headless", &self.headless).finish_non_exhaustive()
    }
}
