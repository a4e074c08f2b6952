pub mod arxiv;
pub mod collector;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod store;
pub mod trend;

pub use collector::{collect_topic, CategoryFilter, TopicRows};
pub use config::{Config, TopicQuery};
pub use error::{DigestError, Result};
pub use pipeline::{run, RunOptions, RunSummary};
pub use record::PaperRecord;
pub use store::{open_store, update_store, TopicStore};
pub use trend::{MonthlyTrend, YearMonth};
