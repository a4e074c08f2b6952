use log::{debug, info};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::RepoLookupConfig;
use crate::error::{DigestError, Result};

/// Finds the code repository published alongside a paper.
pub trait RepoLookup {
    /// `full_id` carries its version suffix. Failures of any kind are `None`.
    fn lookup(&self, full_id: &str) -> Option<String>;
}

impl<F> RepoLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, full_id: &str) -> Option<String> {
        self(full_id)
    }
}

/// Papers-with-Code arXiv lookup (`/api/v0/papers/<id>`).
pub struct PapersWithCode {
    client: Client,
    base_url: String,
}

impl PapersWithCode {
    pub fn new(config: &RepoLookupConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn fetch_official_url(&self, full_id: &str) -> Result<Option<String>> {
        let url = format!("{}/api/v0/papers/{}", self.base_url, full_id);
        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(DigestError::ApiError(format!(
                "Papers-with-Code returned status {}",
                response.status()
            )));
        }

        let body: Value = response.json()?;
        Ok(official_repo_url(&body))
    }
}

impl RepoLookup for PapersWithCode {
    fn lookup(&self, full_id: &str) -> Option<String> {
        match self.fetch_official_url(full_id) {
            Ok(Some(url)) => {
                info!("Found code for {}: {}", full_id, url);
                Some(url)
            }
            Ok(None) => None,
            Err(e) => {
                debug!("Repository lookup failed for {}: {}", full_id, e);
                None
            }
        }
    }
}

/// Extract `official.url` from a lookup response body.
pub fn official_repo_url(body: &Value) -> Option<String> {
    body.get("official")
        .and_then(|o| o.get("url"))
        .and_then(|u| u.as_str())
        .filter(|u| !u.is_empty())
        .map(|u| u.to_string())
}
