//! Application services composed from ports.

mod ingestion;

pub use ingestion::{IngestionPipeline, IngestionReport, ItemFailure, normalize};
