use backoff::ExponentialBackoff;
use log::{info, warn};
use reqwest::blocking::Client;
use std::collections::VecDeque;
use std::time::Duration;

use crate::arxiv::atom::{parse_feed, AtomFeed};
use crate::arxiv::ArxivEntry;
use crate::config::ArxivConfig;
use crate::error::{DigestError, Result};

/// Order in which arXiv returns matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    SubmittedDate,
    LastUpdatedDate,
    Relevance,
}

impl SortOrder {
    fn as_param(self) -> &'static str {
        match self {
            SortOrder::SubmittedDate => "submittedDate",
            SortOrder::LastUpdatedDate => "lastUpdatedDate",
            SortOrder::Relevance => "relevance",
        }
    }
}

/// Blocking client for the arXiv query API.
pub struct ArxivClient {
    client: Client,
    config: ArxivConfig,
}

impl ArxivClient {
    pub fn new(config: &ArxivConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            config: ArxivConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                page_size: config.page_size.max(1),
                ..config.clone()
            },
        })
    }

    /// Lazily page through the results of `query`, yielding at most `max_results` entries.
    pub fn search(&self, query: &str, max_results: usize, sort: SortOrder) -> SearchResults<'_> {
        SearchResults {
            client: self,
            query: query.to_string(),
            sort,
            max_results,
            start: 0,
            yielded: 0,
            total: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Fetch a single page, retrying transient failures with exponential backoff.
    pub fn fetch_page(
        &self,
        query: &str,
        start: usize,
        page_len: usize,
        sort: SortOrder,
    ) -> Result<AtomFeed> {
        let url = format!("{}/api/query", self.config.base_url);
        let params = [
            ("search_query", query.to_string()),
            ("start", start.to_string()),
            ("max_results", page_len.to_string()),
            ("sortBy", sort.as_param().to_string()),
            ("sortOrder", "descending".to_string()),
        ];

        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            max_elapsed_time: Some(self.config.retry_budget()),
            ..Default::default()
        };

        let operation = || -> std::result::Result<AtomFeed, backoff::Error<DigestError>> {
            info!("Querying arXiv: start={}, max_results={}", start, page_len);
            let response = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .map_err(|e| backoff::Error::transient(DigestError::NetworkError(e)))?;

            if !response.status().is_success() {
                warn!("arXiv API returned status {}", response.status());
                return Err(backoff::Error::transient(DigestError::ApiError(format!(
                    "arXiv API returned status {}",
                    response.status()
                ))));
            }

            let body = response
                .text()
                .map_err(|e| backoff::Error::transient(DigestError::NetworkError(e)))?;
            parse_feed(&body).map_err(backoff::Error::permanent)
        };

        backoff::retry(backoff, operation).map_err(|e| match e {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        })
    }
}

/// Result stream of one search. Ends quietly on exhaustion, empty pages and failed pages.
pub struct SearchResults<'a> {
    client: &'a ArxivClient,
    query: String,
    sort: SortOrder,
    max_results: usize,
    start: usize,
    yielded: usize,
    total: Option<usize>,
    buffer: VecDeque<ArxivEntry>,
    exhausted: bool,
}

impl SearchResults<'_> {
    fn fetch_next_page(&mut self) {
        let limit = match self.total {
            Some(total) => total.min(self.max_results),
            None => self.max_results,
        };
        if self.start >= limit {
            self.exhausted = true;
            return;
        }

        if self.start > 0 {
            std::thread::sleep(self.client.config.page_delay());
        }

        let page_len = self.client.config.page_size.min(limit - self.start);
        let feed = match self
            .client
            .fetch_page(&self.query, self.start, page_len, self.sort)
        {
            Ok(feed) => feed,
            Err(e) => {
                warn!(
                    "arXiv query failed at offset {} after retries, stop paging: {}",
                    self.start, e
                );
                self.exhausted = true;
                return;
            }
        };

        if feed.total_results.is_some() {
            self.total = feed.total_results;
        }

        if feed.entries.is_empty() {
            if self.total.map_or(true, |total| self.start < total) {
                warn!("[arXiv] empty page at offset {}, stop paging", self.start);
            }
            self.exhausted = true;
            return;
        }

        self.start += page_len;
        self.buffer.extend(feed.entries);
    }
}

impl Iterator for SearchResults<'_> {
    type Item = ArxivEntry;

    fn next(&mut self) -> Option<ArxivEntry> {
        if self.yielded >= self.max_results {
            return None;
        }
        if self.buffer.is_empty() && !self.exhausted {
            self.fetch_next_page();
        }
        let entry = self.buffer.pop_front()?;
        self.yielded += 1;
        Some(entry)
    }
}
