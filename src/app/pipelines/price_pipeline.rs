use crate::config::TrackerConfig;
use crate::core::aggregator;
use crate::core::categorizer::SessionCategorizer;
use crate::core::extractor::{ContextWindow, PriceExtractor};
use crate::core::history::HistoryStore;
use crate::core::reconciler;
use crate::domain::model::{Aggregates, History, PriceRecord};
use crate::domain::ports::{Fetcher, Pipeline, Storage};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

/// 一次執行所抓到的紀錄
#[derive(Debug, Clone)]
pub struct ScrapeBatch {
    pub run_at: DateTime<Utc>,
    pub venues_attempted: usize,
    pub records: Vec<PriceRecord>,
}

/// History with this run's records appended, plus the recomputed aggregates.
#[derive(Debug, Clone)]
pub struct PriceReport {
    pub history: History,
    pub aggregates: Aggregates,
    pub added: usize,
}

pub struct PricePipeline<S: Storage, F: Fetcher> {
    config: TrackerConfig,
    fetcher: F,
    extractor: PriceExtractor,
    history: HistoryStore<S>,
}

impl<S: Storage, F: Fetcher> PricePipeline<S, F> {
    pub fn new(storage: S, fetcher: F, config: TrackerConfig) -> Self {
        let extractor = PriceExtractor::new(
            SessionCategorizer::new(&config.keywords),
            config.currency_rates.clone(),
            ContextWindow::from(&config.extraction),
        );
        let history = HistoryStore::new(storage, config.output.history_file.clone());
        Self {
            config,
            fetcher,
            extractor,
            history,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn output_file(&self, file_name: &str) -> String {
        Path::new(&self.config.output.output_path)
            .join(file_name)
            .to_string_lossy()
            .into_owned()
    }

    async fn write_aggregates(&self, aggregates: &Aggregates) -> Result<String> {
        let storage = self.history.storage();
        let averages_file = &self.config.output.averages_file;

        let json = serde_json::to_vec_pretty(aggregates)?;
        storage.write_file(averages_file, &json).await?;
        tracing::info!("📈 Averages saved to {}", averages_file);

        if let Some(csv_file) = &self.config.output.summary_csv {
            let csv = aggregator::summary_csv(aggregates)?;
            storage.write_file(csv_file, &csv).await?;
            tracing::info!("📄 Summary CSV saved to {}", csv_file);
        }

        aggregator::log_summary(aggregates);
        Ok(self.output_file(averages_file))
    }

    /// 不抓取網頁，只從既有歷史重新計算統計
    pub async fn refresh_aggregates(&self) -> Result<String> {
        let history = self.history.load().await?;
        tracing::info!(
            "🔄 Recomputing aggregates from {} stored records",
            history.len()
        );
        let aggregates = aggregator::aggregate(&history);
        self.write_aggregates(&aggregates).await
    }
}

#[async_trait::async_trait]
impl<S: Storage, F: Fetcher> Pipeline for PricePipeline<S, F> {
    type Extracted = ScrapeBatch;
    type Transformed = PriceReport;

    async fn extract(&self) -> Result<ScrapeBatch> {
        let run_at = Utc::now();
        let mut records = Vec::new();

        // 依設定順序逐一處理，確保輸出順序固定
        for venue in &self.config.venues {
            tracing::info!("🏄 {} ({})", venue.name, venue.location);
            let result = reconciler::process_venue(&self.fetcher, venue, &self.extractor).await;

            if result.is_persistable() {
                records.push(PriceRecord {
                    venue_id: venue.id.clone(),
                    venue_name: venue.name.clone(),
                    location: venue.location.clone(),
                    tech: venue.tech.clone(),
                    timestamp: run_at,
                    prices: result.prices,
                    source_url: venue.url.clone(),
                    source_type: result.source,
                });
            }
        }

        tracing::info!(
            "📊 {}/{} venues produced records",
            records.len(),
            self.config.venues.len()
        );

        Ok(ScrapeBatch {
            run_at,
            venues_attempted: self.config.venues.len(),
            records,
        })
    }

    async fn transform(&self, batch: ScrapeBatch) -> Result<PriceReport> {
        let mut history = self.history.load().await?;
        let added = history.extend_records(batch.records);
        tracing::debug!(
            "Appended {} records from run at {} ({} venues attempted)",
            added,
            batch.run_at.to_rfc3339(),
            batch.venues_attempted
        );

        let aggregates = aggregator::aggregate(&history);
        Ok(PriceReport {
            history,
            aggregates,
            added,
        })
    }

    async fn load(&self, report: PriceReport) -> Result<String> {
        let mut history = report.history;
        self.history.save(&mut history).await?;
        tracing::info!("➕ {} new records this run", report.added);
        self.write_aggregates(&report.aggregates).await
    }
}
