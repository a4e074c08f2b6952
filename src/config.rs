use log::{debug, info};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DigestError, Result};

/// One named search: the topic it files papers under, the arXiv query and a result cap.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopicQuery {
    pub name: String,
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl TopicQuery {
    pub fn new(name: impl Into<String>, query: impl Into<String>, max_results: usize) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            max_results,
        }
    }
}

fn default_max_results() -> usize {
    50
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    pub base_url: String,
    pub page_size: usize,
    pub page_delay_secs: u64,
    pub retry_max_elapsed_secs: u64,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: "http://export.arxiv.org".to_string(),
            page_size: 20,
            page_delay_secs: 3,
            retry_max_elapsed_secs: 30,
        }
    }
}

impl ArxivConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_secs(self.page_delay_secs)
    }

    pub fn retry_budget(&self) -> Duration {
        Duration::from_secs(self.retry_max_elapsed_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RepoLookupConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for RepoLookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://arxiv.paperswithcode.com".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_path: PathBuf,
    pub output_dir: PathBuf,
    pub topics: Vec<TopicQuery>,
    /// A paper is considered only if one of its categories is listed here.
    pub keep: BTreeSet<String>,
    /// Any of these categories drops a paper, even a kept one.
    pub block: BTreeSet<String>,
    pub arxiv: ArxivConfig,
    pub repo_lookup: RepoLookupConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("docs/arxiv-daily.json"),
            output_dir: PathBuf::from("."),
            topics: default_topics(),
            keep: to_set(&["cs.CL", "cs.SE", "cs.AI", "cs.LG", "cs.NE", "cs.PL"]),
            block: to_set(&["eess.AS", "cs.SD", "eess.SP", "q-bio.BM"]),
            arxiv: ArxivConfig::default(),
            repo_lookup: RepoLookupConfig::default(),
        }
    }
}

fn to_set(codes: &[&str]) -> BTreeSet<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

fn default_topics() -> Vec<TopicQuery> {
    vec![
        TopicQuery::new(
            "MA-CoEvo",
            r#"(all:"co-evolution" OR all:"co-evolving" OR all:"collaborative evolution") AND (all:"agent" OR all:"multi-agent" OR all:"dual-agent" OR all:"LLM")"#,
            50,
        ),
        TopicQuery::new(
            "MA-CoEvo-RL",
            r#"(abs:"co-evolution" OR abs:"co-evolving") AND (abs:"multi-agent" OR abs:"dual-agent") AND (abs:"reinforcement learning" OR abs:"RL" OR abs:"PPO")"#,
            50,
        ),
        TopicQuery::new(
            "CodeGeneration_LLM",
            r#"(all:"code generation" OR all:"program synthesis" OR all:"text-to-code") AND (all:"LLM" OR all:"Large Language Model")"#,
            50,
        ),
        TopicQuery::new(
            "GUI_LLM_RL_MA",
            r#"(abs:"GUI testing" OR abs:"Android testing" OR abs:"mobile app testing") AND (abs:"LLM" OR abs:"Large Language Model" OR abs:"Agent") AND (abs:"reinforcement learning" OR abs:"multi-agent" OR abs:"co-evolution" OR abs:"evolutionary")"#,
            50,
        ),
    ]
}

impl Config {
    /// Parse a TOML config. Missing keys fall back to the built-in defaults.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| DigestError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading config from {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| DigestError::io(path, e))?;
        Self::from_toml_str(&content, path)
    }

    /// Apply the `ARXIV_BASE_URL`, `PWC_BASE_URL` and `API_TIMEOUT_SECS` overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ARXIV_BASE_URL") {
            debug!("Using arXiv base URL from environment: {}", url);
            self.arxiv.base_url = url;
        }
        if let Ok(url) = std::env::var("PWC_BASE_URL") {
            debug!("Using Papers-with-Code base URL from environment: {}", url);
            self.repo_lookup.base_url = url;
        }
        if let Some(secs) = std::env::var("API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.arxiv.retry_max_elapsed_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.topics.is_empty() {
            return Err(DigestError::NoTopicsConfigured);
        }
        Ok(())
    }
}
