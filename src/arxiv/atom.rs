use chrono::{DateTime, NaiveDate};
use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::arxiv::ArxivEntry;
use crate::error::{DigestError, Result};

/// A parsed page of search results.
#[derive(Debug, Default)]
pub struct AtomFeed {
    /// `opensearch:totalResults`, when the feed carries it.
    pub total_results: Option<usize>,
    pub entries: Vec<ArxivEntry>,
}

#[derive(Default)]
struct EntryAccum {
    id: String,
    updated: String,
    published: String,
    title: String,
    summary: String,
    categories: Vec<String>,
}

impl EntryAccum {
    fn push_text(&mut self, tag: &str, text: &str) {
        match tag {
            "id" => self.id.push_str(text),
            "updated" => self.updated.push_str(text),
            "published" => self.published.push_str(text),
            "title" => self.title.push_str(text),
            "summary" => self.summary.push_str(text),
            _ => {}
        }
    }

    fn into_entry(self) -> Option<ArxivEntry> {
        let id = self.id.trim().to_string();
        // arXiv reports query errors as entries with an `api/errors` id.
        if !id.contains("/abs/") {
            warn!("Skipping feed entry without an abstract id: {}", id);
            return None;
        }

        let published = parse_date(&self.published);
        let updated = match parse_date(&self.updated).or(published) {
            Some(date) => date,
            None => {
                warn!("Skipping entry {} with no usable date", id);
                return None;
            }
        };

        Some(ArxivEntry {
            entry_id: id,
            updated,
            published,
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            categories: self.categories,
        })
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    value
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Event-driven state for one feed document.
#[derive(Default)]
struct FeedParser {
    feed: AtomFeed,
    accum: Option<EntryAccum>,
    current_tag: String,
    total_text: String,
}

impl FeedParser {
    fn handle_start(&mut self, e: &BytesStart<'_>) {
        let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        match self.accum.as_mut() {
            None if tag == "entry" => self.accum = Some(EntryAccum::default()),
            None => self.current_tag = tag,
            Some(accum) if tag == "category" => Self::add_category(accum, e),
            Some(_) => self.current_tag = tag,
        }
    }

    fn handle_empty(&mut self, e: &BytesStart<'_>) {
        if let Some(accum) = self.accum.as_mut() {
            if e.local_name().as_ref() == b"category" {
                Self::add_category(accum, e);
            }
        }
    }

    fn add_category(accum: &mut EntryAccum, e: &BytesStart<'_>) {
        if let Some(term) = attribute(e, b"term") {
            if !accum.categories.contains(&term) {
                accum.categories.push(term);
            }
        }
    }

    fn handle_text(&mut self, text: &str) {
        match self.accum.as_mut() {
            Some(accum) => accum.push_text(&self.current_tag, text),
            None if self.current_tag == "totalResults" => self.total_text.push_str(text),
            None => {}
        }
    }

    fn handle_end(&mut self, local_name: &[u8]) {
        match local_name {
            b"entry" => {
                if let Some(entry) = self.accum.take().and_then(EntryAccum::into_entry) {
                    self.feed.entries.push(entry);
                }
            }
            b"totalResults" => {
                self.feed.total_results = self.total_text.trim().parse().ok();
            }
            _ => {}
        }
        self.current_tag.clear();
    }
}

/// Parse one arXiv Atom response body.
pub fn parse_feed(xml: &str) -> Result<AtomFeed> {
    let mut reader = Reader::from_str(xml);
    let mut parser = FeedParser::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => parser.handle_start(e),
            Ok(Event::Empty(ref e)) => parser.handle_empty(e),
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| DigestError::FeedError(err.to_string()))?;
                parser.handle_text(&text);
            }
            Ok(Event::End(ref e)) => parser.handle_end(e.local_name().as_ref()),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(DigestError::FeedError(format!(
                    "malformed feed at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    debug!(
        "Parsed {} feed entries (total results: {:?})",
        parser.feed.entries.len(),
        parser.feed.total_results
    );
    Ok(parser.feed)
}
