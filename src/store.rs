use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::collector::TopicRows;
use crate::error::{DigestError, Result};
use crate::record::{
    escape_separators, make_collapsible, split_cells, ABSTRACT_COLUMN, COLLAPSIBLE_MARKER, ROW_COLUMNS,
    TITLE_COLUMN,
};

/// All persisted rows: topic name -> stable id -> row.
pub type TopicStore = BTreeMap<String, TopicRows>;

/// What a merge did to one topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The fetch for this topic was empty; stored rows were left alone.
    Skipped,
    Merged { added: usize, replaced: usize },
}

/// Read the store at `path`. A missing or blank file is an empty store.
pub fn load_store(path: &Path) -> Result<TopicStore> {
    if !path.exists() {
        info!("No store at {:?}, starting empty", path);
        return Ok(TopicStore::new());
    }

    let content = fs::read_to_string(path).map_err(|e| DigestError::io(path, e))?;
    let content = content.trim();
    if content.is_empty() {
        info!("Store {:?} is empty, starting empty", path);
        return Ok(TopicStore::new());
    }

    serde_json::from_str(content).map_err(|source| DigestError::CorruptStore {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the whole store to `path`, creating parent directories.
pub fn save_store(path: &Path, store: &TopicStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| DigestError::io(parent, e))?;
        }
    }

    let json = serde_json::to_string_pretty(store)?;
    fs::write(path, json).map_err(|e| DigestError::io(path, e))?;
    info!("Store written to {:?}", path);
    Ok(())
}

/// Last cell of a bold `**title**` starting at `start`.
///
/// Legacy titles were never escaped, so a title may span several cells.
/// An unbolded title is taken to be a single cell.
fn title_end(cells: &[&str], start: usize) -> Option<usize> {
    let first = cells.get(start)?.trim();
    if !first.starts_with("**") {
        return Some(start);
    }
    if first.len() >= 4 && first.ends_with("**") {
        return Some(start);
    }
    (start + 1..cells.len()).find(|&i| cells[i].trim_end().ends_with("**"))
}

/// Rewrite a legacy row so its abstract is collapsible.
///
/// Rows that already carry the marker, or that do not have the listing
/// shape, come back unchanged. The title runs to its closing `**` and the
/// abstract is whatever lies between the categories and the two trailing
/// cells, so stray separators in old titles and abstracts are absorbed
/// rather than shifting the columns.
pub fn upgrade_legacy_row(row: &str) -> String {
    if row.contains(COLLAPSIBLE_MARKER) {
        return row.to_string();
    }

    let newline = if row.ends_with('\n') { "\n" } else { "" };
    let body = row.trim_end_matches('\n');
    let cells = split_cells(body);

    // One empty cell before the first separator and one after the last.
    if cells.len() < ROW_COLUMNS + 2 {
        debug!("Row does not match the listing shape, kept verbatim");
        return row.to_string();
    }

    let title_start = 1 + TITLE_COLUMN;
    let tail_len = ROW_COLUMNS - ABSTRACT_COLUMN;
    let abstract_end = cells.len() - tail_len;
    // The categories cell and at least one abstract cell follow the title.
    let title_limit = abstract_end - (ABSTRACT_COLUMN - TITLE_COLUMN);
    let title_last = match title_end(&cells[..title_limit], title_start) {
        Some(last) => last,
        None => {
            debug!("Row title has no closing marker, kept verbatim");
            return row.to_string();
        }
    };
    let abstract_start = title_last + (ABSTRACT_COLUMN - TITLE_COLUMN);
    let abstract_text = cells[abstract_start..abstract_end].join("|");

    let mut upgraded: Vec<String> = cells[..title_start].iter().map(|c| c.to_string()).collect();
    upgraded.push(escape_separators(&cells[title_start..=title_last].join("|")));
    upgraded.extend(cells[title_last + 1..abstract_start].iter().map(|c| c.to_string()));
    upgraded.push(format!(" {}", make_collapsible(abstract_text.trim())));
    upgraded.extend(cells[abstract_end..].iter().map(|c| c.to_string()));

    upgraded.join("|") + newline
}

/// Upgrade every legacy row in place. Returns how many rows changed.
pub fn migrate_store(store: &mut TopicStore) -> usize {
    let mut migrated = 0;
    for rows in store.values_mut() {
        for row in rows.values_mut() {
            let upgraded = upgrade_legacy_row(row);
            if upgraded != *row {
                *row = upgraded;
                migrated += 1;
            }
        }
    }
    migrated
}

/// Union freshly collected topics into the store; fetched rows win.
pub fn merge_topics<I>(store: &mut TopicStore, collected: I) -> Vec<(String, MergeOutcome)>
where
    I: IntoIterator<Item = (String, TopicRows)>,
{
    let mut outcomes = Vec::new();
    for (topic, rows) in collected {
        if rows.is_empty() {
            warn!("[{}] no papers fetched, keeping stored rows", topic);
            outcomes.push((topic, MergeOutcome::Skipped));
            continue;
        }

        let existing = store.entry(topic.clone()).or_default();
        let mut added = 0;
        let mut replaced = 0;
        for (id, row) in rows {
            match existing.insert(id, row) {
                Some(_) => replaced += 1,
                None => added += 1,
            }
        }
        info!("[{}] {} new rows, {} refreshed", topic, added, replaced);
        outcomes.push((topic, MergeOutcome::Merged { added, replaced }));
    }
    outcomes
}

/// Load the store at `path` with every legacy row upgraded in memory.
pub fn open_store(path: &Path) -> Result<TopicStore> {
    let mut store = load_store(path)?;

    let migrated = migrate_store(&mut store);
    if migrated > 0 {
        info!("Upgraded {} legacy rows", migrated);
    }
    Ok(store)
}

/// Merge freshly collected topics into `store` and write it back to `path`.
pub fn update_store<I>(
    path: &Path,
    store: &mut TopicStore,
    collected: I,
) -> Result<Vec<(String, MergeOutcome)>>
where
    I: IntoIterator<Item = (String, TopicRows)>,
{
    let outcomes = merge_topics(store, collected);
    save_store(path, store)?;
    Ok(outcomes)
}
