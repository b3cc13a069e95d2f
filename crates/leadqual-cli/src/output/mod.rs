//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use leadqual_core::{IngestStats, QualificationResult};

/// Format a qualification result
pub fn format_qualification(result: &QualificationResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_qualification(result),
        OutputFormat::Cli => terminal::format_qualification(result),
    }
}

/// Format an ingest summary
pub fn format_ingest(stats: &IngestStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(stats),
        OutputFormat::Cli => format!(
            "Ingested {} file(s): {} chunk(s), {} new\n",
            stats.files, stats.chunks, stats.added
        ),
    }
}
