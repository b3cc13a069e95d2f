//! Status command

use crate::app::OutputFormat;
use anyhow::Result;
use leadqual_core::error::exit_codes;
use leadqual_core::{Config, Services, VectorStore};

pub async fn run(config: &Config, format: OutputFormat) -> Result<i32> {
    let services = Services::from_config(config)?;
    let documents = services.store.count().await?;
    let sources = services.store.sources()?;

    match format {
        OutputFormat::Json => {
            let status = serde_json::json!({
                "database": config.store.db_path,
                "collection": config.store.collection,
                "documents": documents,
                "sources": sources,
                "llm_url": config.llm_service.url,
                "chat_model": config.llm_service.model,
                "embedding_model": config.llm_service.embedding_model,
                "min_relevance": config.pipeline.min_relevance,
                "max_candidates": config.pipeline.max_candidates,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        OutputFormat::Cli => {
            println!("Database:        {}", config.store.db_path.display());
            println!("Collection:      {}", config.store.collection);
            println!("Documents:       {}", documents);
            for source in &sources {
                println!("  {}", source);
            }
            println!();
            println!("LLM service:     {}", config.llm_service.url);
            println!("  Chat model:    {}", config.llm_service.model);
            println!("  Embeddings:    {}", config.llm_service.embedding_model);
            println!();
            println!("Pipeline:");
            println!("  Min relevance: {}", config.pipeline.min_relevance);
            println!("  Candidates:    {}", config.pipeline.max_candidates);
            println!("  Product:       {}", config.pipeline.product_path.display());
        }
    }
    Ok(exit_codes::SUCCESS)
}
