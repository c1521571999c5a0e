//! Lead persistence boundary
//!
//! The pipeline hands the sink one ordered batch per run. Rows are keyed
//! by identity key, so repeated runs update matching rows instead of
//! appending duplicates.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use leadscout_core::{IdentityKey, Lead};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("sink encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Counts from one publish call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReceipt {
    pub appended: usize,
    pub updated: usize,
}

/// Persistence target for final, scored leads
#[async_trait]
pub trait LeadSink: Send + Sync {
    /// Persist the batch, updating rows whose identity key already exists
    async fn append_or_update(&self, leads: &[Lead]) -> Result<SinkReceipt, SinkError>;
}

/// JSONL file as the shared lead table, one lead per line
pub struct JsonlTableSink {
    path: PathBuf,
}

impl JsonlTableSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Existing rows; a missing table file is an empty table
    fn load_rows(&self) -> Result<Vec<Lead>, SinkError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut rows = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            rows.push(serde_json::from_str(line)?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl LeadSink for JsonlTableSink {
    async fn append_or_update(&self, leads: &[Lead]) -> Result<SinkReceipt, SinkError> {
        let mut rows = self.load_rows()?;
        let mut index: HashMap<IdentityKey, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.identity_key(), i))
            .collect();

        let mut receipt = SinkReceipt::default();
        for lead in leads {
            match index.get(&lead.identity_key()) {
                Some(&i) => {
                    rows[i] = lead.clone();
                    receipt.updated += 1;
                }
                None => {
                    index.insert(lead.identity_key(), rows.len());
                    rows.push(lead.clone());
                    receipt.appended += 1;
                }
            }
        }

        let mut out = String::new();
        for row in &rows {
            out.push_str(&serde_json::to_string(row)?);
            out.push('\n');
        }
        fs::write(&self.path, out)?;

        info!(
            "sink wrote {} rows to {} ({} new, {} updated)",
            rows.len(),
            self.path.display(),
            receipt.appended,
            receipt.updated
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn lead(domain: &str, score: f64) -> Lead {
        let mut lead = Lead::new("Acme Dental", "dentist", "Springfield", "google_places");
        lead.domain = Some(domain.to_string());
        lead.score = Some(score);
        lead
    }

    fn temp_table() -> PathBuf {
        std::env::temp_dir().join(format!("leadscout-table-{}.jsonl", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn repeated_runs_update_instead_of_duplicating() {
        let path = temp_table();
        let sink = JsonlTableSink::new(&path);

        let first = sink
            .append_or_update(&[lead("acme.com", 30.0), lead("other.com", 10.0)])
            .await
            .unwrap();
        assert_eq!(first, SinkReceipt { appended: 2, updated: 0 });

        let second = sink
            .append_or_update(&[lead("acme.com", 55.0), lead("third.com", 20.0)])
            .await
            .unwrap();
        assert_eq!(second, SinkReceipt { appended: 1, updated: 1 });

        let rows = sink.load_rows().unwrap();
        assert_eq!(rows.len(), 3);
        let acme = rows.iter().find(|r| r.domain.as_deref() == Some("acme.com")).unwrap();
        assert_eq!(acme.score, Some(55.0));

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn missing_table_starts_empty() {
        let path = temp_table();
        let sink = JsonlTableSink::new(&path);
        assert!(sink.load_rows().unwrap().is_empty());

        let receipt = sink.append_or_update(&[lead("acme.com", 1.0)]).await.unwrap();
        assert_eq!(receipt.appended, 1);
        fs::remove_file(&path).unwrap();
    }
}
