//! Short-link expansion
//!
//! Shortened share links (`vm.tiktok.com/...`) are followed to their final
//! location before being handed to the task runner. Resolution never fails:
//! any network problem degrades to using the link as given.

use crate::config::RedirectConfig;
use crate::error::Result;
use std::time::Duration;

/// Upper bound on a single redirect lookup
const RESOLVE_TIMEOUT_SECS: u64 = 15;

/// Follows redirects for links on known short-link hosts
#[derive(Clone, Debug)]
pub struct RedirectResolver {
    client: reqwest::Client,
    hosts: Vec<String>,
}

impl RedirectResolver {
    /// Create a resolver for the configured short-link hosts
    pub fn new(config: &RedirectConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(RESOLVE_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            hosts: config
                .short_link_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
        })
    }

    /// Whether `url` points at one of the short-link hosts (or a subdomain of one)
    pub fn is_short_link(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        self.hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
    }

    /// Resolve `url` to its final location if it is a short link
    ///
    /// Returns `url` unchanged when it is not a short link or when the lookup fails.
    pub async fn resolve(&self, url: &str) -> String {
        if !self.is_short_link(url) {
            return url.to_string();
        }

        match self.client.get(url).send().await {
            Ok(response) => {
                let resolved = response.url().to_string();
                tracing::debug!(original = %url, resolved = %resolved, "Resolved short link");
                resolved
            }
            Err(e) => {
                tracing::warn!(
                    url = %url,
                    error = %e,
                    "Short link resolution failed, using original URL"
                );
                url.to_string()
            }
        }
    }
}
