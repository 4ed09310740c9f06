use clap::Parser;
use surf_price_etl::core::parsers;
use surf_price_etl::utils::error::ErrorSeverity;
use surf_price_etl::utils::{logger, validation::Validate};
use surf_price_etl::{
    CliConfig, EtlEngine, EtlError, HttpFetcher, LocalStorage, PricePipeline, TrackerConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting surf-price-etl");
    tracing::info!("📁 Loading configuration from: {}", cli.config);
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_tracker_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &cli);

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No pages will be fetched and nothing is written");
        perform_dry_run(&config);
        return Ok(());
    }

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output.output_path.clone());
    let fetcher = match HttpFetcher::new(&config.fetch) {
        Ok(fetcher) => fetcher,
        Err(e) => exit_with(&e),
    };
    let pipeline = PricePipeline::new(storage, fetcher, config);

    let outcome = if cli.aggregate_only {
        tracing::info!("📊 Aggregate-only mode: skipping venue fetches");
        pipeline.refresh_aggregates().await
    } else {
        EtlEngine::new_with_monitoring(pipeline, cli.monitor)
            .run()
            .await
    };

    match outcome {
        Ok(output_path) => {
            tracing::info!("✅ Price tracking run completed successfully!");
            tracing::info!("📁 Averages saved to: {}", output_path);
            println!("✅ Price tracking run completed successfully!");
            println!("📁 Averages saved to: {}", output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn exit_with(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}

fn display_config_summary(config: &TrackerConfig, cli: &CliConfig) {
    println!("📋 Configuration Summary:");
    println!(
        "  Tracker: {} v{}",
        config.tracker.name,
        config.tracker.version.as_deref().unwrap_or("-")
    );
    println!("  Venues: {}", config.venues.len());
    println!("  Output: {}", config.output.output_path);
    println!("  History: {}", config.output.history_file);
    println!("  Averages: {}", config.output.averages_file);
    if let Some(csv) = &config.output.summary_csv {
        println!("  Summary CSV: {}", csv);
    }
    println!("  Timeout: {}s", config.fetch.timeout_seconds);

    if cli.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    if cli.aggregate_only {
        println!("  📊 AGGREGATE-ONLY MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TrackerConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("🌊 Venue Plan:");
    for venue in &config.venues {
        let strategy = if parsers::is_known_strategy(&venue.parser) {
            venue.parser.clone()
        } else {
            format!("{} (unknown, falls back to {})", venue.parser, parsers::GENERIC_STRATEGY)
        };
        let fallback = match venue.known_prices_usd(&config.currency_rates) {
            Some(prices) => format!("known prices {}", prices),
            None => "none".to_string(),
        };

        println!("  {} - {} ({})", venue.id, venue.name, venue.location);
        println!("    URL: {}", venue.url);
        println!("    Strategy: {}", strategy);
        println!("    Currency: {}", venue.currency.code());
        println!("    Fallback: {}", fallback);
    }

    println!();
    println!("💱 Currency Rates (to USD):");
    println!("  USD: {}", config.currency_rates.usd);
    println!("  GBP: {}", config.currency_rates.gbp);
    println!("  EUR: {}", config.currency_rates.eur);
}
