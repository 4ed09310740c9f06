use crate::domain::model::{
    round2, Aggregates, History, PriceTier, SourceType, TierStats, VenueAggregate,
};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug)]
struct VenueAccumulator {
    park_name: String,
    location: String,
    tech: String,
    scrape_count: usize,
    first_scrape: DateTime<Utc>,
    last_scrape: DateTime<Utc>,
    prices: BTreeMap<PriceTier, Vec<f64>>,
    monthly: BTreeMap<String, BTreeMap<PriceTier, Vec<f64>>>,
    sources: BTreeMap<SourceType, usize>,
}

fn mean(values: &[f64]) -> f64 {
    round2(values.iter().sum::<f64>() / values.len() as f64)
}

fn tier_stats(values: &[f64]) -> Option<TierStats> {
    let current = *values.last()?;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(TierStats {
        current,
        running_avg: mean(values),
        min,
        max,
        data_points: values.len(),
    })
}

/// 從完整歷史重新計算各場館的統計
///
/// Single pass in stored order; nothing is carried over between runs, so the
/// output is a pure function of `history`.
pub fn aggregate(history: &History) -> Aggregates {
    let mut venues: BTreeMap<String, VenueAccumulator> = BTreeMap::new();

    for record in &history.scrapes {
        let venue = venues
            .entry(record.venue_id.clone())
            .or_insert_with(|| VenueAccumulator {
                park_name: record.venue_name.clone(),
                location: record.location.clone(),
                tech: record.tech.clone(),
                scrape_count: 0,
                first_scrape: record.timestamp,
                last_scrape: record.timestamp,
                prices: BTreeMap::new(),
                monthly: BTreeMap::new(),
                sources: BTreeMap::new(),
            });

        venue.scrape_count += 1;
        venue.last_scrape = record.timestamp;
        *venue.sources.entry(record.source_type).or_default() += 1;

        let month_key = record.month_key();
        for (tier, price) in record.prices.iter() {
            venue.prices.entry(tier).or_default().push(price);
            venue
                .monthly
                .entry(month_key.clone())
                .or_default()
                .entry(tier)
                .or_default()
                .push(price);
        }
    }

    venues
        .into_iter()
        .map(|(park_id, venue)| {
            let averages = venue
                .prices
                .iter()
                .filter_map(|(tier, values)| tier_stats(values).map(|stats| (*tier, stats)))
                .collect();

            let monthly_averages = venue
                .monthly
                .iter()
                .map(|(month, tiers)| {
                    let per_tier = tiers
                        .iter()
                        .filter(|(_, values)| !values.is_empty())
                        .map(|(tier, values)| (*tier, mean(values)))
                        .collect();
                    (month.clone(), per_tier)
                })
                .collect();

            let aggregate = VenueAggregate {
                park_id: park_id.clone(),
                park_name: venue.park_name,
                location: venue.location,
                tech: venue.tech,
                scrape_count: venue.scrape_count,
                first_scrape: venue.first_scrape,
                last_scrape: venue.last_scrape,
                averages,
                monthly_averages,
                source_breakdown: venue.sources,
            };
            (park_id, aggregate)
        })
        .collect()
}

/// Logs the per-venue running averages table.
pub fn log_summary(aggregates: &Aggregates) {
    tracing::info!("📈 Running averages summary");
    for venue in aggregates.values() {
        tracing::info!(
            "{} ({}) | Scrapes: {} | First: {} | Last: {}",
            venue.park_name,
            venue.location,
            venue.scrape_count,
            venue.first_scrape.format("%Y-%m-%d"),
            venue.last_scrape.format("%Y-%m-%d")
        );
        for (tier, stats) in &venue.averages {
            tracing::info!(
                "  {:<13} Current: ${:>7.2}  Avg: ${:>7.2}  Range: ${:.0}-${:.0}  ({} pts)",
                tier.as_str(),
                stats.current,
                stats.running_avg,
                stats.min,
                stats.max,
                stats.data_points
            );
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    park_id: &'a str,
    park_name: &'a str,
    location: &'a str,
    tier: PriceTier,
    current: f64,
    running_avg: f64,
    min: f64,
    max: f64,
    data_points: usize,
    scrape_count: usize,
    first_scrape: DateTime<Utc>,
    last_scrape: DateTime<Utc>,
}

/// One CSV row per (venue, tier).
pub fn summary_csv(aggregates: &Aggregates) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for venue in aggregates.values() {
        for (tier, stats) in &venue.averages {
            writer.serialize(SummaryRow {
                park_id: &venue.park_id,
                park_name: &venue.park_name,
                location: &venue.location,
                tier: *tier,
                current: stats.current,
                running_avg: stats.running_avg,
                min: stats.min,
                max: stats.max,
                data_points: stats.data_points,
                scrape_count: venue.scrape_count,
                first_scrape: venue.first_scrape,
                last_scrape: venue.last_scrape,
            })?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}
