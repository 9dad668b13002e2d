//! Fetch Client (§4.D): reqwest wrapped with cookie jar, UA rotation, and
//! rate-governed GET/HEAD, grounded on the original `http.py`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;
use crate::fetch::proxy_rotator::ProxyEntry;
use crate::fetch::rate_governor::DomainKind;
use crate::fetch::ua_pool::browser_headers;
use crate::fetch::{ProxyRotator, RateGovernor, UserAgentPool};
use crate::utils::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS};

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub final_url: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub elapsed_ms: u64,
}

impl FetchResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// Thin anti-detection HTTP client (§4.D): one reqwest client with a shared
/// cookie jar, user-agent rotated every `rotate_ua_every_n_requests`
/// requests, all traffic paced by a `RateGovernor`.
pub struct FetchClient {
    client: Client,
    proxied_clients: DashMap<String, Client>,
    governor: Arc<RateGovernor>,
    proxies: Arc<ProxyRotator>,
    ua_pool: UserAgentPool,
    rotate_every: usize,
    request_count: std::sync::atomic::AtomicUsize,
}

fn build_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS))
        .build()
        .expect("reqwest client builds with a static config")
}

impl FetchClient {
    #[must_use]
    pub fn new(governor: Arc<RateGovernor>, rotate_every: usize, proxies: Arc<ProxyRotator>) -> Self {
        Self {
            client: build_client(),
            proxied_clients: DashMap::new(),
            governor,
            proxies,
            ua_pool: UserAgentPool::new(true),
            rotate_every,
            request_count: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Returns the plain client, or a cached client routed through `proxy`
    /// when the proxy rotator handed us one (§4.C: "supplies identities to
    /// the fetch client").
    fn client_for(&self, proxy: Option<&ProxyEntry>) -> Result<Client, FetchError> {
        let Some(proxy) = proxy else { return Ok(self.client.clone()) };
        let key = proxy.url();
        if let Some(client) = self.proxied_clients.get(&key) {
            return Ok(client.clone());
        }
        let handle = reqwest::Proxy::all(&key).map_err(|source| FetchError::Proxy { proxy: key.clone(), source })?;
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS))
            .proxy(handle)
            .build()
            .map_err(|source| FetchError::Proxy { proxy: key.clone(), source })?;
        self.proxied_clients.insert(key, client.clone());
        Ok(client)
    }

    fn current_headers(&self) -> BTreeMap<&'static str, String> {
        let count = self.request_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let ua = if count % self.rotate_every.max(1) == 0 { self.ua_pool.next() } else { self.ua_pool.random() };
        browser_headers(ua)
    }

    fn domain_of(url: &str) -> String {
        url::Url::parse(url).ok().and_then(|u| u.host_str().map(ToString::to_string)).unwrap_or_default()
    }

    async fn execute(
        &self,
        url: &str,
        kind: DomainKind,
        method: reqwest::Method,
    ) -> Result<FetchResponse, FetchError> {
        let domain = Self::domain_of(url);
        let mut attempt = 0_u32;

        loop {
            self.governor
                .acquire(&domain, kind)
                .await
                .map_err(|_| FetchError::SessionLimit { url: url.to_string() })?;

            let proxy = self.proxies.next();
            let client = self.client_for(proxy.as_ref())?;

            let started = Instant::now();
            let mut builder = client.request(method.clone(), url);
            for (k, v) in self.current_headers() {
                builder = builder.header(k, v);
            }

            let result = builder.send().await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let final_url = response.url().to_string();
                    let headers: BTreeMap<String, String> = response
                        .headers()
                        .iter()
                        .map(|(k, v)| (k.as_str().to_lowercase(), v.to_str().unwrap_or_default().to_string()))
                        .collect();

                    if (200..400).contains(&status) {
                        self.governor.report_success(&domain);
                        if let Some(proxy) = &proxy {
                            self.proxies.report_success(&proxy.host, proxy.port);
                        }
                        let body = response.text().await.unwrap_or_default();
                        return Ok(FetchResponse { status, final_url, headers, body, elapsed_ms });
                    }

                    self.governor.report_error(&domain, status);
                    if let Some(proxy) = &proxy {
                        self.proxies.report_failure(&proxy.host, proxy.port, status == 403 || status == 429);
                    }
                    if self.governor.should_retry(status, attempt) {
                        attempt += 1;
                        tokio::time::sleep(self.governor.retry_delay(attempt)).await;
                        continue;
                    }
                    return Err(FetchError::RetriesExhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        status,
                    });
                }
                Err(source) => {
                    if let Some(proxy) = &proxy {
                        self.proxies.report_failure(&proxy.host, proxy.port, false);
                    }
                    let is_timeout = source.is_timeout();
                    if self.governor.should_retry_network_error(attempt) {
                        attempt += 1;
                        debug!(url, attempt, is_timeout, "retrying after network error");
                        tokio::time::sleep(self.governor.retry_delay(attempt)).await;
                        continue;
                    }
                    if is_timeout {
                        return Err(FetchError::Timeout { url: url.to_string() });
                    }
                    return Err(FetchError::Network { url: url.to_string(), source });
                }
            }
        }
    }

    pub async fn get(&self, url: &str, kind: DomainKind) -> Result<FetchResponse, FetchError> {
        self.execute(url, kind, reqwest::Method::GET).await
    }

    pub async fn head(&self, url: &str, kind: DomainKind) -> Result<FetchResponse, FetchError> {
        self.execute(url, kind, reqwest::Method::HEAD).await
    }
}
