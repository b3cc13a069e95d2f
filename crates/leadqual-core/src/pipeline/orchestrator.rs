//! Pipeline sequencing: extract → retrieve → qualify

use super::{
    FilterExtractor, LeadScore, PipelineConfig, PipelineOutcome, QualificationResult, Qualifier,
    Retrieval, Retriever,
};
use crate::error::{LeadQualError, Result};
use crate::llm::LLMClient;
use crate::store::VectorStore;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pipeline stage, used for progress logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Retrieving,
    Qualifying,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extracting => "extracting",
            Stage::Retrieving => "retrieving",
            Stage::Qualifying => "qualifying",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Runs the lead-qualification pipeline.
///
/// Holds no per-run state; one instance can serve concurrent runs.
pub struct Orchestrator {
    extractor: FilterExtractor,
    retriever: Retriever,
    qualifier: Qualifier,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn LLMClient>,
        store: Arc<dyn VectorStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extractor: FilterExtractor::new(client.clone()),
            retriever: Retriever::new(store),
            qualifier: Qualifier::new(client),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, description: &str) -> Result<PipelineOutcome> {
        if description.trim().is_empty() {
            return Err(LeadQualError::InvalidInput(
                "lead description cannot be empty".to_string(),
            ));
        }

        let started = Instant::now();

        let stage_start = enter(Stage::Extracting);
        let filter = self.extractor.extract(description).await?;
        tracing::info!(
            "Extracted filter {:?} in {:?}",
            filter,
            stage_start.elapsed()
        );

        let stage_start = enter(Stage::Retrieving);
        let retrieval = self
            .retriever
            .retrieve(
                &filter,
                self.config.max_candidates,
                self.config.min_relevance,
            )
            .await?;
        tracing::info!("Retrieval took {:?}", stage_start.elapsed());

        let lead = match retrieval {
            Retrieval::Selected(lead) => lead,
            Retrieval::NotFound => {
                tracing::info!(
                    "No lead above relevance {} ({:?} total)",
                    self.config.min_relevance,
                    started.elapsed()
                );
                return Ok(PipelineOutcome::NoRelevantLead);
            }
        };
        tracing::info!("Selected lead with relevance {:.3}", lead.relevance_score);

        let stage_start = enter(Stage::Qualifying);
        let qualification = self
            .qualifier
            .qualify(&lead, &self.config.product_description)
            .await;
        tracing::info!("Qualification took {:?}", stage_start.elapsed());

        let score_justification = qualification.score_justification.unwrap_or_else(|e| {
            tracing::warn!("Scoring failed: {}", e);
            format!("Error scoring lead: {}", e)
        });
        let draft_email = qualification.draft_email.unwrap_or_else(|e| {
            tracing::warn!("Email drafting failed: {}", e);
            format!("Error generating email: {}", e)
        });
        let lead_score = LeadScore::parse(&score_justification);

        enter(Stage::Done);
        tracing::info!("Pipeline finished in {:?}", started.elapsed());

        Ok(PipelineOutcome::Qualified(QualificationResult {
            selected_lead: lead,
            score_justification,
            draft_email,
            lead_score,
            filter,
        }))
    }

    /// [`run`](Self::run) bounded by `timeout`.
    ///
    /// On expiry the run future is dropped, cancelling every in-flight call.
    pub async fn run_with_deadline(
        &self,
        description: &str,
        timeout: Duration,
    ) -> Result<PipelineOutcome> {
        match tokio::time::timeout(timeout, self.run(description)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!("Pipeline exceeded deadline of {:?}", timeout);
                Err(LeadQualError::DeadlineExceeded(timeout.as_millis() as u64))
            }
        }
    }
}

fn enter(stage: Stage) -> Instant {
    tracing::debug!("Pipeline stage: {}", stage);
    Instant::now()
}
