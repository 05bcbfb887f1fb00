//! Record emission: budget reservation, persistence, commit

use crate::crawler::budget::JobBudget;
use crate::extract::JobRecord;
use crate::output::StatsCollector;
use crate::storage::{RecordSink, StorageError};
use std::sync::Arc;

/// What happened to a finished record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// Persisted; carries the scraped count after this record
    Emitted { scraped: usize },
    /// The budget was already spent; nothing persisted
    OverBudget,
    /// The sink already holds a record for this URL
    Duplicate,
    /// The sink failed; nothing counted
    Failed(String),
}

/// Hands complete records to the sink within the job budget
///
/// A slot is reserved before the sink sees the record and committed only
/// after the sink accepted it, so `scraped` can never pass the target and a
/// failed append leaves the budget untouched.
pub struct RecordEmitter {
    budget: Arc<JobBudget>,
    sink: Arc<dyn RecordSink>,
    stats: Arc<StatsCollector>,
}

impl RecordEmitter {
    pub fn new(
        budget: Arc<JobBudget>,
        sink: Arc<dyn RecordSink>,
        stats: Arc<StatsCollector>,
    ) -> Self {
        Self {
            budget,
            sink,
            stats,
        }
    }

    pub fn emit(&self, record: JobRecord) -> Emission {
        let Some(slot) = self.budget.try_reserve() else {
            tracing::debug!("Budget spent, dropping {}", record.url);
            self.stats.budget_rejection();
            return Emission::OverBudget;
        };

        match self.sink.append(&record) {
            Ok(()) => {
                let scraped = slot.commit();
                self.stats.record_emitted();
                tracing::info!(
                    "Emitted {}/{}: {} ({})",
                    scraped,
                    self.budget.target(),
                    record.title,
                    record.url
                );
                if scraped == self.budget.target() {
                    tracing::info!("Job budget of {} reached", scraped);
                }
                Emission::Emitted { scraped }
            }
            Err(StorageError::Duplicate(url)) => {
                tracing::debug!("Record for {} already stored", url);
                self.stats.duplicate();
                Emission::Duplicate
            }
            Err(e) => {
                tracing::warn!("Failed to store record for {}: {}", record.url, e);
                self.stats.sink_failure();
                Emission::Failed(e.to_string())
            }
        }
    }
}
