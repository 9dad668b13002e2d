//! User-Agent pool and rotation (§4.A), grounded on `user_agents.py`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::seq::IndexedRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
}

#[derive(Debug, Clone)]
pub struct UserAgentInfo {
    pub user_agent: &'static str,
    pub browser: Browser,
    pub platform: &'static str,
}

fn pool() -> Vec<UserAgentInfo> {
    vec![
        UserAgentInfo {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            browser: Browser::Chrome,
            platform: "Windows",
        },
        UserAgentInfo {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
            browser: Browser::Chrome,
            platform: "Windows",
        },
        UserAgentInfo {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            browser: Browser::Chrome,
            platform: "macOS",
        },
        UserAgentInfo {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            browser: Browser::Chrome,
            platform: "macOS",
        },
        UserAgentInfo {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
            browser: Browser::Firefox,
            platform: "Windows",
        },
        UserAgentInfo {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
            browser: Browser::Firefox,
            platform: "Windows",
        },
        UserAgentInfo {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.2; rv:121.0) Gecko/20100101 Firefox/121.0",
            browser: Browser::Firefox,
            platform: "macOS",
        },
        UserAgentInfo {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
            browser: Browser::Safari,
            platform: "macOS",
        },
        UserAgentInfo {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
            browser: Browser::Edge,
            platform: "Windows",
        },
    ]
}

/// Rotates user agents with an optional Chrome-weighted distribution
/// (3x Chrome, 2x Firefox, 1x others), matching `UserAgentRotator`.
pub struct UserAgentPool {
    agents: Vec<UserAgentInfo>,
    weighted: Vec<usize>,
    current_index: AtomicUsize,
    request_count: AtomicUsize,
}

impl UserAgentPool {
    #[must_use]
    pub fn new(prefer_chrome: bool) -> Self {
        let agents = pool();
        let weighted = if prefer_chrome {
            agents
                .iter()
                .enumerate()
                .flat_map(|(i, a)| {
                    let reps = match a.browser {
                        Browser::Chrome => 3,
                        Browser::Firefox => 2,
                        _ => 1,
                    };
                    std::iter::repeat(i).take(reps)
                })
                .collect()
        } else {
            (0..agents.len()).collect()
        };
        Self { agents, weighted, current_index: AtomicUsize::new(0), request_count: AtomicUsize::new(0) }
    }

    #[must_use]
    pub fn random(&self) -> &'static str {
        let mut rng = rand::rng();
        let idx = *self.weighted.choose(&mut rng).expect("pool is non-empty");
        self.agents[idx].user_agent
    }

    #[must_use]
    pub fn next(&self) -> &'static str {
        let idx = self.current_index.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| {
            Some((i + 1) % self.agents.len())
        });
        let idx = idx.unwrap_or(0);
        self.agents[idx].user_agent
    }

    /// Rotates after `rotate_every` calls, otherwise returns the current
    /// fixed agent (§4.A rotation cadence).
    #[must_use]
    pub fn with_count(&self, rotate_every: usize) -> &'static str {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        if count >= rotate_every {
            self.request_count.store(0, Ordering::SeqCst);
            return self.next();
        }
        self.agents[self.current_index.load(Ordering::SeqCst)].user_agent
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Full browser-credible header bundle for a given user agent (§4.A).
#[must_use]
pub fn browser_headers(user_agent: &str) -> BTreeMap<&'static str, String> {
    let mut headers = BTreeMap::new();
    headers.insert("User-Agent", user_agent.to_string());
    headers.insert(
        "Accept",
        if user_agent.contains("Firefox") {
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8".to_string()
        } else {
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8"
                .to_string()
        },
    );
    headers.insert("Accept-Language", "de-DE,de;q=0.9,en-US;q=0.8,en;q=0.7".to_string());
    headers.insert("Accept-Encoding", "gzip, deflate, br".to_string());
    headers.insert("Connection", "keep-alive".to_string());
    headers.insert("Upgrade-Insecure-Requests", "1".to_string());
    headers.insert("Sec-Fetch-Dest", "document".to_string());
    headers.insert("Sec-Fetch-Mode", "navigate".to_string());
    headers.insert("Sec-Fetch-Site", "none".to_string());
    headers.insert("Sec-Fetch-User", "?1".to_string());
    headers.insert("Cache-Control", "max-age=0".to_string());

    if user_agent.contains("Chrome") || user_agent.contains("Edg") {
        headers.insert("Sec-Ch-Ua", r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#.to_string());
        headers.insert("Sec-Ch-Ua-Mobile", "?0".to_string());
        headers.insert(
            "Sec-Ch-Ua-Platform",
            if user_agent.contains("Windows") { "\"Windows\"".to_string() } else { "\"macOS\"".to_string() },
        );
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_is_non_empty_and_weighted_toward_chrome() {
        let pool = UserAgentPool::new(true);
        assert!(pool.weighted.len() > pool.agents.len());
    }

    #[test]
    fn next_cycles_through_all_agents() {
        let pool = UserAgentPool::new(false);
        let first = pool.next();
        for _ in 0..pool.len() - 1 {
            let _ = pool.next();
        }
        assert_eq!(pool.next(), first);
    }

    #[test]
    fn firefox_headers_omit_sec_ch_ua() {
        let headers = browser_headers("Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0");
        assert!(!headers.contains_key("Sec-Ch-Ua"));
    }
}
