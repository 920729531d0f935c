//! Output module for checkpoints and run summaries
//!
//! This module handles:
//! - Writing per-batch checkpoint files as batches finish
//! - Writing the combined files at the end of a run
//! - Summarising and printing run statistics

mod checkpoint;
pub mod stats;

pub use checkpoint::{encode_csv, encode_json, field_union, CheckpointWriter, FINAL_CSV, FINAL_JSON};
pub use stats::{print_summary, HarvestSummary};
