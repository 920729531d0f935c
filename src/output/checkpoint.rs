//! Checkpoint files
//!
//! Each batch is written to its own CSV and JSON pair as soon as it finishes,
//! so a crash loses at most the batch in flight. The complete files are
//! written once, after the last batch.

use crate::record::{Record, IDENTIFIER_FIELD};
use crate::CheckpointError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Final combined CSV file name
pub const FINAL_CSV: &str = "students_complete.csv";

/// Final combined JSON file name
pub const FINAL_JSON: &str = "student_data_complete.json";

/// Writes batch and final output files into one directory
#[derive(Debug, Clone)]
pub struct CheckpointWriter {
    directory: PathBuf,
}

impl CheckpointWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn batch_csv_path(&self, batch_number: usize) -> PathBuf {
        self.directory
            .join(format!("students_batch_{}.csv", batch_number))
    }

    pub fn batch_json_path(&self, batch_number: usize) -> PathBuf {
        self.directory
            .join(format!("student_data_batch_{}.json", batch_number))
    }

    pub fn final_csv_path(&self) -> PathBuf {
        self.directory.join(FINAL_CSV)
    }

    pub fn final_json_path(&self) -> PathBuf {
        self.directory.join(FINAL_JSON)
    }

    /// Persists one batch's records
    ///
    /// The CSV header is the union of field names within this batch only, so
    /// headers may differ between batch files. An empty batch writes nothing.
    ///
    /// # Arguments
    ///
    /// * `records` - Successful records of the batch, in completion order
    /// * `batch_number` - 1-based batch number used in the file names
    pub async fn write_batch(
        &self,
        records: &[Record],
        batch_number: usize,
    ) -> Result<(), CheckpointError> {
        if records.is_empty() {
            tracing::info!("Batch {} has no records, nothing to save", batch_number);
            return Ok(());
        }

        write_atomic(&self.batch_csv_path(batch_number), &encode_csv(records)?).await?;
        write_atomic(&self.batch_json_path(batch_number), &encode_json(records)?).await?;

        tracing::info!("Saved batch {} with {} records", batch_number, records.len());
        Ok(())
    }

    /// Persists the whole run
    ///
    /// Always writes both files, even for an empty run, with a CSV header
    /// covering every field seen anywhere in the run.
    pub async fn write_final(&self, records: &[Record]) -> Result<(), CheckpointError> {
        write_atomic(&self.final_csv_path(), &encode_csv(records)?).await?;
        write_atomic(&self.final_json_path(), &encode_json(records)?).await?;

        tracing::info!(
            "Saved {} records to {} and {}",
            records.len(),
            self.final_csv_path().display(),
            self.final_json_path().display()
        );
        Ok(())
    }
}

/// Union of field names, identifier first, then in first-seen order
pub fn field_union(records: &[Record]) -> Vec<String> {
    let mut fields = vec![IDENTIFIER_FIELD.to_string()];

    for record in records {
        for name in record.field_names() {
            if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }
    }

    fields
}

/// Encodes records as CSV; missing fields become empty cells
pub fn encode_csv(records: &[Record]) -> Result<Vec<u8>, CheckpointError> {
    let header = field_union(records);
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&header)?;
    for record in records {
        writer.write_record(header.iter().map(|field| record.get(field).unwrap_or("")))?;
    }

    writer
        .into_inner()
        .map_err(|e| CheckpointError::Io(std::io::Error::new(e.error().kind(), e.to_string())))
}

/// Encodes records as a pretty-printed JSON array
pub fn encode_json(records: &[Record]) -> Result<Vec<u8>, CheckpointError> {
    Ok(serde_json::to_vec_pretty(records)?)
}

/// Write to a temp file, then rename into place
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CheckpointError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
