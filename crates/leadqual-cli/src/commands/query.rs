//! Query command

use crate::app::{self, OutputFormat, QueryArgs};
use crate::output;
use anyhow::Result;
use leadqual_core::error::exit_codes;
use leadqual_core::{Config, LeadQualError, PipelineOutcome, Services};
use std::io::Read;
use std::time::Duration;

pub async fn run(args: QueryArgs, mut config: Config, format: OutputFormat) -> Result<i32> {
    let description = match app::joined(&args.text) {
        Some(text) => text,
        None => read_stdin()?,
    };
    if description.trim().is_empty() {
        return Err(LeadQualError::InvalidInput("lead description cannot be empty".to_string()).into());
    }

    if let Some(product) = args.product {
        config.pipeline.product_path = product;
    }
    if let Some(min_relevance) = args.min_relevance {
        config.pipeline.min_relevance = min_relevance;
    }

    let services = Services::from_config(&config)?;
    let orchestrator = services.orchestrator(&config)?;

    let outcome = match args.timeout {
        Some(secs) => {
            orchestrator
                .run_with_deadline(description.trim(), Duration::from_secs(secs))
                .await?
        }
        None => orchestrator.run(description.trim()).await?,
    };

    match outcome {
        PipelineOutcome::Qualified(result) => {
            print!("{}", output::format_qualification(&result, format));
            Ok(exit_codes::SUCCESS)
        }
        PipelineOutcome::NoRelevantLead => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "error": "no relevant lead found" })),
                OutputFormat::Cli => eprintln!(
                    "No lead scored at or above {}",
                    config.pipeline.min_relevance
                ),
            }
            Ok(exit_codes::NOT_FOUND)
        }
    }
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
