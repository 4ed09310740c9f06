pub mod aggregator;
pub mod categorizer;
pub mod etl;
pub mod extractor;
pub mod history;
pub mod parsers;
pub mod reconciler;

pub use crate::domain::ports::{Fetcher, Pipeline, SiteParser, Storage};
pub use crate::utils::error::Result;
