pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::HttpFetcher;
pub use app::pipelines::PricePipeline;
pub use config::{cli::LocalStorage, TrackerConfig, VenueConfig};
pub use core::etl::EtlEngine;
pub use domain::model::{History, PriceObservation, PriceRecord, PriceTier, SourceType};
pub use utils::error::{EtlError, Result};
