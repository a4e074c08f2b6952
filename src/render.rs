use chrono::NaiveDate;
use log::info;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::collector::TopicRows;
use crate::error::{DigestError, Result};
use crate::record::{TABLE_DIVIDER, TABLE_HEADER};
use crate::store::TopicStore;

pub const INDEX_FILE: &str = "README.md";

fn display_date(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}

pub fn topic_file_name(topic: &str) -> String {
    format!("{}.md", topic)
}

/// File-name friendly form of a topic, used for chart images.
pub fn topic_slug(topic: &str) -> String {
    topic
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
        .collect()
}

fn link_target(path: &str) -> String {
    path.replace(' ', "%20")
}

/// Markdown listing of one topic, newest identifiers first.
pub fn render_topic_page(
    topic: &str,
    rows: &TopicRows,
    date: NaiveDate,
    trend_image: Option<&str>,
) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", topic));
    output.push_str(&format!("> Updated on {}\n\n", display_date(date)));
    output.push_str(&format!("[🔙 Back to Index]({})\n\n", INDEX_FILE));

    if let Some(image) = trend_image {
        output.push_str(&format!("![Monthly Trend]({})\n\n", link_target(image)));
    }

    output.push_str(TABLE_HEADER);
    output.push('\n');
    output.push_str(TABLE_DIVIDER);
    output.push('\n');

    // BTreeMap iterates ascending; listings read newest first.
    for row in rows.values().rev() {
        output.push_str(row.trim_end_matches('\n'));
        output.push('\n');
    }

    output.push_str(&format!(
        "\n<p align=right>(<a href='#{}'>back to top</a>)</p>\n",
        topic.to_lowercase().replace(' ', "-")
    ));
    output
}

/// Markdown index linking every topic that has papers.
pub fn render_index(store: &TopicStore, date: NaiveDate, trend_image: Option<&str>) -> String {
    let mut output = String::new();
    output.push_str("# Daily ArXiv Papers\n\n");
    output.push_str(&format!("> Last Updated: {}\n\n", display_date(date)));

    if let Some(image) = trend_image {
        output.push_str(&format!("![Monthly Trend]({})\n\n", link_target(image)));
    }

    output.push_str("## Topic List\n\n");
    output.push_str("Click to view papers:\n\n");

    for (topic, rows) in store.iter().filter(|(_, rows)| !rows.is_empty()) {
        let noun = if rows.len() == 1 { "paper" } else { "papers" };
        output.push_str(&format!(
            "- [**{}**]({}) ({} {})\n",
            topic,
            link_target(&topic_file_name(topic)),
            rows.len(),
            noun
        ));
    }
    output
}

/// Chart images to embed, relative to the output directory.
#[derive(Debug, Default, Clone)]
pub struct PageImages {
    pub overall: Option<String>,
    pub per_topic: BTreeMap<String, String>,
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| DigestError::io(path, e))
}

/// Write one page per non-empty topic plus the index. Returns the paths written.
pub fn write_pages(
    store: &TopicStore,
    output_dir: &Path,
    date: NaiveDate,
    images: &PageImages,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|e| DigestError::io(output_dir, e))?;

    let mut written = Vec::new();
    for (topic, rows) in store {
        if rows.is_empty() {
            continue;
        }
        let path = output_dir.join(topic_file_name(topic));
        let page = render_topic_page(
            topic,
            rows,
            date,
            images.per_topic.get(topic).map(String::as_str),
        );
        write_file(&path, &page)?;
        written.push(path);
    }

    let index_path = output_dir.join(INDEX_FILE);
    write_file(&index_path, &render_index(store, date, images.overall.as_deref()))?;
    written.push(index_path);

    info!("Wrote {} pages to {:?}", written.len(), output_dir);
    Ok(written)
}
