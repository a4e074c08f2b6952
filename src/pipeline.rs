use chrono::NaiveDate;
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::arxiv::{ArxivClient, PapersWithCode, RepoLookup, SortOrder};
use crate::collector::{collect_topic, CategoryFilter, TopicRows};
use crate::config::Config;
use crate::error::Result;
use crate::render::{topic_slug, write_pages, PageImages};
use crate::store::{open_store, update_store, MergeOutcome, TopicStore};
use crate::trend::chart::draw_trend;
use crate::trend::MonthlyTrend;

pub const IMAGE_DIR: &str = "imgs";
pub const OVERALL_CHART: &str = "trend.svg";

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Render from the stored state without querying arXiv.
    pub skip_fetch: bool,
    /// Date stamped on the generated pages.
    pub date: NaiveDate,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub merges: Vec<(String, MergeOutcome)>,
    pub charts: Vec<PathBuf>,
    /// Topics that had no dated papers and therefore no chart.
    pub uncharted: Vec<String>,
    pub pages: Vec<PathBuf>,
}

/// Hands out chart file names that are unique within one output directory.
///
/// Distinct topics can share a slug (`A B` and `A-B`), and a topic can slug
/// to the overall chart's name. Later claimants get a numeric suffix.
#[derive(Debug)]
pub struct ChartNames {
    taken: BTreeSet<String>,
}

impl Default for ChartNames {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartNames {
    pub fn new() -> Self {
        let mut taken = BTreeSet::new();
        taken.insert(OVERALL_CHART.to_string());
        Self { taken }
    }

    pub fn claim(&mut self, topic: &str) -> String {
        let slug = topic_slug(topic);
        let mut name = format!("{}.svg", slug);
        let mut suffix = 2;
        while self.taken.contains(&name) {
            name = format!("{}-{}.svg", slug, suffix);
            suffix += 1;
        }
        if suffix > 2 {
            warn!("[{}] chart {}.svg is already taken, writing {}", topic, slug, name);
        }
        self.taken.insert(name.clone());
        name
    }
}

/// Query every configured topic in turn.
pub fn collect_all<L>(config: &Config, client: &ArxivClient, lookup: &L) -> Vec<(String, TopicRows)>
where
    L: RepoLookup + ?Sized,
{
    let filter = CategoryFilter::from_config(config);
    config
        .topics
        .iter()
        .map(|topic| {
            info!("Keyword: {}", topic.name);
            let results = client.search(&topic.query, topic.max_results, SortOrder::SubmittedDate);
            let rows = collect_topic(&topic.name, results, &filter, lookup);
            (topic.name.clone(), rows)
        })
        .collect()
}

/// Draw per-topic charts and the overall chart under `<output_dir>/imgs`.
pub fn draw_charts(store: &TopicStore, config: &Config, summary: &mut RunSummary) -> PageImages {
    let mut images = PageImages::default();
    let image_dir = config.output_dir.join(IMAGE_DIR);
    let mut names = ChartNames::new();

    for (topic, rows) in store {
        let trend = MonthlyTrend::from_rows(rows);
        if trend.is_empty() {
            info!("[{}] no data for a trend chart", topic);
            summary.uncharted.push(topic.clone());
            continue;
        }

        let file_name = names.claim(topic);
        let path = image_dir.join(&file_name);
        match draw_trend(&trend, &path) {
            Ok(true) => {
                images
                    .per_topic
                    .insert(topic.clone(), format!("{}/{}", IMAGE_DIR, file_name));
                summary.charts.push(path);
            }
            Ok(false) => summary.uncharted.push(topic.clone()),
            Err(e) => warn!("[{}] chart failed: {}", topic, e),
        }
    }

    let overall = MonthlyTrend::from_ids(store.values().flat_map(|rows| rows.keys().map(String::as_str)));
    let path = image_dir.join(OVERALL_CHART);
    match draw_trend(&overall, &path) {
        Ok(true) => {
            images.overall = Some(format!("{}/{}", IMAGE_DIR, OVERALL_CHART));
            summary.charts.push(path);
        }
        Ok(false) => info!("no data"),
        Err(e) => warn!("Overall chart failed: {}", e),
    }

    images
}

/// One full run: load, migrate, fetch, merge, save, chart, render.
pub fn run(config: &Config, options: &RunOptions) -> Result<RunSummary> {
    config.validate()?;
    let mut summary = RunSummary::default();

    // Load first so a corrupt store stops the run before any network traffic.
    let mut store = open_store(&config.store_path)?;

    if options.skip_fetch {
        info!("Fetching disabled, rendering {} stored topics", store.len());
    } else {
        let client = ArxivClient::new(&config.arxiv)?;
        let lookup = PapersWithCode::new(&config.repo_lookup)?;
        let collected = collect_all(config, &client, &lookup);

        summary.merges = update_store(&config.store_path, &mut store, collected)?;
    }

    let images = draw_charts(&store, config, &mut summary);
    summary.pages = write_pages(&store, &config.output_dir, options.date, &images)?;
    Ok(summary)
}
