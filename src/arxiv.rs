pub mod atom;
pub mod repo;
pub mod search;

use chrono::NaiveDate;

use crate::record::PaperRecord;

pub use atom::{parse_feed, AtomFeed};
pub use repo::{PapersWithCode, RepoLookup};
pub use search::{ArxivClient, SearchResults, SortOrder};

/// One entry of an arXiv Atom feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArxivEntry {
    /// Abstract page URL, e.g. `http://arxiv.org/abs/2301.00001v2`.
    pub entry_id: String,
    pub updated: NaiveDate,
    pub published: Option<NaiveDate>,
    pub title: String,
    pub summary: String,
    pub categories: Vec<String>,
}

impl ArxivEntry {
    /// The identifier after `/abs/`, version suffix included.
    pub fn short_id(&self) -> &str {
        match self.entry_id.find("/abs/") {
            Some(pos) => &self.entry_id[pos + 5..],
            None => &self.entry_id,
        }
    }

    pub fn into_record(self, repo_url: Option<String>) -> PaperRecord {
        PaperRecord {
            full_id: self.short_id().to_string(),
            updated: self.updated,
            title: self.title,
            categories: self.categories,
            abstract_text: self.summary.replace('\n', " "),
            url: self.entry_id,
            repo_url,
        }
    }
}
