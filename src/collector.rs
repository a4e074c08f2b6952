use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

use crate::arxiv::{ArxivEntry, RepoLookup};
use crate::config::Config;

/// Formatted rows of one topic, keyed by stable identifier.
pub type TopicRows = BTreeMap<String, String>;

/// Category allow-list and block-list applied to every candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryFilter {
    pub keep: BTreeSet<String>,
    pub block: BTreeSet<String>,
}

impl CategoryFilter {
    pub fn new<K, B, S>(keep: K, block: B) -> Self
    where
        K: IntoIterator<Item = S>,
        B: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keep: keep.into_iter().map(Into::into).collect(),
            block: block.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            keep: config.keep.clone(),
            block: config.block.clone(),
        }
    }

    /// Keep when any category is allowed, unless any category is blocked.
    pub fn accepts<S: AsRef<str>>(&self, categories: &[S]) -> bool {
        let kept = categories.iter().any(|c| self.keep.contains(c.as_ref()));
        if !kept {
            return false;
        }
        !categories.iter().any(|c| self.block.contains(c.as_ref()))
    }
}

/// Filter, format and key the candidates of one topic.
///
/// The repository lookup runs only for candidates that pass the filter. A
/// later candidate with the same stable id replaces an earlier one.
pub fn collect_topic<I, L>(topic: &str, candidates: I, filter: &CategoryFilter, lookup: &L) -> TopicRows
where
    I: IntoIterator<Item = ArxivEntry>,
    L: RepoLookup + ?Sized,
{
    let mut rows = TopicRows::new();
    let mut seen = 0usize;

    for entry in candidates {
        seen += 1;
        if !filter.accepts(&entry.categories) {
            debug!(
                "[{}] filtered out {} ({})",
                topic,
                entry.short_id(),
                entry.categories.join(", ")
            );
            continue;
        }

        let repo_url = lookup.lookup(entry.short_id());
        let record = entry.into_record(repo_url);
        rows.insert(record.stable_id().to_string(), record.to_row());
    }

    info!("[{}] kept {}/{} papers", topic, rows.len(), seen);
    rows
}
