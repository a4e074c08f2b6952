pub mod chart;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

static YYMM_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{2})([0-9]{2})").expect("Invalid YYMM prefix regex pattern")
});

/// Calendar month a paper was submitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Read the `YYMM` prefix of a modern arXiv identifier.
    ///
    /// `91`..=`99` are the 1990s, anything else is `20YY`. Returns `None`
    /// unless the first four characters are digits forming a valid month.
    pub fn from_identifier(id: &str) -> Option<Self> {
        let captures = YYMM_PREFIX_REGEX.captures(id)?;
        let yy: i32 = captures[1].parse().ok()?;
        let month: u32 = captures[2].parse().ok()?;
        let year = if yy >= 91 { 1900 + yy } else { 2000 + yy };

        NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self { year, month })
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Monthly paper counts with per-year averages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlyTrend {
    /// Chronological `(month, count)` pairs; only months with papers appear.
    pub buckets: Vec<(YearMonth, usize)>,
    /// Total papers in a year divided by that year's months with data.
    pub yearly_average: BTreeMap<i32, f64>,
}

impl MonthlyTrend {
    /// Bucket identifiers by submission month, skipping malformed ones.
    pub fn from_ids<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: BTreeMap<YearMonth, usize> = BTreeMap::new();
        for id in ids {
            if let Some(ym) = YearMonth::from_identifier(id) {
                *counts.entry(ym).or_default() += 1;
            } else {
                log::debug!("Identifier {} has no YYMM prefix, skipped", id);
            }
        }

        let mut year_totals: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
        for (ym, count) in &counts {
            let (total, months) = year_totals.entry(ym.year).or_default();
            *total += count;
            *months += 1;
        }

        let yearly_average = year_totals
            .into_iter()
            .map(|(year, (total, months))| (year, total as f64 / months as f64))
            .collect();

        Self {
            buckets: counts.into_iter().collect(),
            yearly_average,
        }
    }

    pub fn from_rows<V>(rows: &BTreeMap<String, V>) -> Self {
        Self::from_ids(rows.keys().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|(_, count)| count).sum()
    }

    pub fn count(&self, label: &str) -> Option<usize> {
        self.buckets
            .iter()
            .find(|(ym, _)| ym.to_string() == label)
            .map(|(_, count)| *count)
    }

    /// Indices into `buckets` covered by each year, first to last.
    pub fn year_spans(&self) -> BTreeMap<i32, (usize, usize)> {
        let mut spans: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
        for (idx, (ym, _)) in self.buckets.iter().enumerate() {
            spans
                .entry(ym.year)
                .and_modify(|span| span.1 = idx)
                .or_insert((idx, idx));
        }
        spans
    }
}
