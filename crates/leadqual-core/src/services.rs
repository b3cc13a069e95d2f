//! Wiring of the concrete client and store from configuration

use crate::agents::{LlmPlanner, Router};
use crate::config::Config;
use crate::error::Result;
use crate::llm::{LLMClient, MetricsSnapshot, VLLMClient};
use crate::pipeline::{Orchestrator, PipelineConfig};
use crate::store::{SqliteVectorStore, VectorStore};
use std::sync::Arc;

/// Shared handles built once per process
#[derive(Clone)]
pub struct Services {
    pub client: Arc<VLLMClient>,
    pub store: Arc<SqliteVectorStore>,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let client = Arc::new(VLLMClient::new(config.llm_service.clone())?);
        let store = Arc::new(SqliteVectorStore::open(
            &config.store.db_path,
            config.store.collection.clone(),
            client.clone(),
        )?);
        tracing::debug!(
            "Opened store {} (collection {})",
            config.store.db_path.display(),
            config.store.collection
        );
        Ok(Self { client, store })
    }

    /// Pipeline orchestrator; reads the product description from disk
    pub fn orchestrator(&self, config: &Config) -> Result<Orchestrator> {
        let pipeline = PipelineConfig::from_settings(&config.pipeline)?;
        let client: Arc<dyn LLMClient> = self.client.clone();
        let store: Arc<dyn VectorStore> = self.store.clone();
        Ok(Orchestrator::new(client, store, pipeline))
    }

    /// Multi-agent router; the planner may use its own model
    pub fn router(&self, config: &Config) -> Router {
        let planner_client: Arc<dyn LLMClient> = match &config.router.model {
            Some(model) => Arc::new(self.client.with_chat_model(model.clone())),
            None => self.client.clone(),
        };
        let planner = Arc::new(LlmPlanner::new(planner_client));
        Router::new(planner, self.client.clone()).with_max_handoffs(config.router.max_handoffs)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.client.metrics()
    }
}
