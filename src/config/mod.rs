pub mod cli;
pub mod toml_config;

pub use toml_config::{TrackerConfig, VenueConfig};

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "surf-price-etl")]
#[command(about = "Scrape surf park session prices and keep a running price history")]
pub struct CliConfig {
    /// Path to the tracker TOML configuration
    #[arg(short, long, default_value = "configs/surf-parks.toml")]
    pub config: String,

    /// Override output.output_path from the config
    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log phase timings and memory usage")]
    pub monitor: bool,

    #[arg(long, help = "Show the venue plan without fetching or writing")]
    pub dry_run: bool,

    #[arg(long, help = "Recompute aggregates from the stored history without fetching")]
    pub aggregate_only: bool,

    #[arg(long, help = "Emit logs as JSON lines (for scheduled runs)")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入 TOML 配置並套用命令列覆蓋設定
    pub fn load_tracker_config(&self) -> crate::Result<TrackerConfig> {
        let mut config = TrackerConfig::from_file(&self.config)?;
        if let Some(output_path) = &self.output_path {
            config.output.output_path = output_path.clone();
        }
        Ok(config)
    }
}
