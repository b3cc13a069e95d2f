//! Ingest command

use crate::app::{IngestArgs, OutputFormat};
use crate::output;
use crate::progress::ProgressReporter;
use anyhow::Result;
use leadqual_core::error::exit_codes;
use leadqual_core::{ingest_path_with_progress, Config, MarkdownSplitter, Services};

pub async fn run(args: IngestArgs, config: &Config, format: OutputFormat) -> Result<i32> {
    let services = Services::from_config(config)?;
    let splitter = MarkdownSplitter::new(leadqual_core::ingest::DEFAULT_SEPARATOR, args.chunk_size);

    let mut progress = ProgressReporter::new();
    let stats = ingest_path_with_progress(
        services.store.as_ref(),
        &args.path,
        &splitter,
        |file, index, total| progress.file(file, index, total),
    )
    .await?;
    progress.finish();

    print!("{}", output::format_ingest(&stats, format));
    Ok(exit_codes::SUCCESS)
}
