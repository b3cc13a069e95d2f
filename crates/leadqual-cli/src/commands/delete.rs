//! Delete command

use crate::app::OutputFormat;
use anyhow::Result;
use leadqual_core::error::exit_codes;
use leadqual_core::{Config, Services, VectorStore};

pub async fn run(config: &Config, format: OutputFormat) -> Result<i32> {
    let services = Services::from_config(config)?;
    let removed = services.store.remove_collection().await?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "collection": config.store.collection,
                "removed": removed,
            })
        ),
        OutputFormat::Cli => println!(
            "Removed {} document(s) from collection '{}'",
            removed, config.store.collection
        ),
    }
    Ok(exit_codes::SUCCESS)
}
