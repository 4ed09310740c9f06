use crate::domain::model::{History, PriceRecord};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};

impl History {
    /// Append-only. Records with no prices are dropped; returns whether the
    /// record was added.
    pub fn append(&mut self, record: PriceRecord) -> bool {
        if record.prices.is_empty() {
            tracing::debug!("Dropping empty record for {}", record.venue_id);
            return false;
        }
        self.scrapes.push(record);
        true
    }

    pub fn extend_records<I: IntoIterator<Item = PriceRecord>>(&mut self, records: I) -> usize {
        records
            .into_iter()
            .map(|record| self.append(record))
            .filter(|added| *added)
            .count()
    }

    /// 存檔前更新中繼資料
    pub fn refresh_metadata(&mut self, now: DateTime<Utc>) {
        self.metadata.last_updated = Some(now);
        self.metadata.total_scrapes = self.scrapes.len();
    }
}

/// JSON history file behind a [`Storage`].
pub struct HistoryStore<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> HistoryStore<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Missing file starts a fresh history.
    pub async fn load(&self) -> Result<History> {
        match self.storage.read_file(&self.file_name).await {
            Ok(bytes) => {
                let history: History = serde_json::from_slice(&bytes)?;
                tracing::debug!(
                    "Loaded {} records from {}",
                    history.len(),
                    self.file_name
                );
                Ok(history)
            }
            Err(EtlError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("📂 No history at {}, starting a new one", self.file_name);
                Ok(History::new(Utc::now()))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self, history: &mut History) -> Result<()> {
        history.refresh_metadata(Utc::now());
        let json = serde_json::to_vec_pretty(history)?;
        self.storage.write_file(&self.file_name, &json).await?;
        tracing::info!(
            "💾 Saved to {} ({} total records)",
            self.file_name,
            history.len()
        );
        Ok(())
    }
}
