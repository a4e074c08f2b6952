use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static VERSION_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"v[0-9]+$").expect("Invalid version suffix regex pattern")
});

/// Marker present in every row whose abstract is already collapsible.
pub const COLLAPSIBLE_MARKER: &str = "<details";

/// Summary text shown on the collapsed abstract.
pub const ABSTRACT_SUMMARY: &str = "Full Abstract";

/// Columns of a listing row: Date, Title, Categories, Abstract, PDF, Code.
pub const ROW_COLUMNS: usize = 6;

/// Index of the title column within `ROW_COLUMNS`.
pub const TITLE_COLUMN: usize = 1;

/// Index of the abstract column within `ROW_COLUMNS`.
pub const ABSTRACT_COLUMN: usize = 3;

pub const TABLE_HEADER: &str = "| Date | Title | Categories | Abstract | PDF | Code |";
pub const TABLE_DIVIDER: &str = "|:---|:---|:---|:---|:---|:---|";

/// A paper as fetched, before it is flattened into a listing row.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperRecord {
    /// Identifier including its version suffix, e.g. `2301.00001v2`.
    pub full_id: String,
    pub updated: NaiveDate,
    pub title: String,
    pub categories: Vec<String>,
    pub abstract_text: String,
    /// Abstract page URL (the Atom entry id).
    pub url: String,
    pub repo_url: Option<String>,
}

impl PaperRecord {
    /// The identifier with its version suffix removed; this is the store key.
    pub fn stable_id(&self) -> &str {
        strip_version(&self.full_id)
    }

    /// Render the record as one markdown table row.
    pub fn to_row(&self) -> String {
        let title = escape_separators(&collapse_whitespace(&self.title));
        let abstract_cell = make_collapsible(&collapse_whitespace(&self.abstract_text));
        let code = match &self.repo_url {
            Some(url) => format!("**[code]({})**|", url),
            None => "null|".to_string(),
        };

        format!(
            "|**{}**|**{}**|{}| {}|[{}]({})| {}",
            self.updated.format("%Y-%m-%d"),
            title,
            self.categories.join(", "),
            abstract_cell,
            self.full_id,
            self.url,
            code
        )
    }
}

/// Strip a trailing `vN` version suffix from an arXiv identifier.
pub fn strip_version(full_id: &str) -> &str {
    match VERSION_SUFFIX_REGEX.find(full_id) {
        Some(suffix) => &full_id[..suffix.start()],
        None => full_id,
    }
}

/// Wrap text in a `<details>` block, escaping table separators.
pub fn make_collapsible(text: &str) -> String {
    format!(
        "<details><summary>{}</summary>{}</details>",
        ABSTRACT_SUMMARY,
        escape_separators(text)
    )
}

/// Escape every `|` that is not already escaped.
pub fn escape_separators(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    for c in text.chars() {
        if c == '|' && prev != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Split a row on unescaped `|` separators.
pub fn split_cells(row: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut start = 0;
    let mut prev = None;
    for (i, c) in row.char_indices() {
        if c == '|' && prev != Some('\\') {
            cells.push(&row[start..i]);
            start = i + 1;
        }
        prev = Some(c);
    }
    cells.push(&row[start..]);
    cells
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
