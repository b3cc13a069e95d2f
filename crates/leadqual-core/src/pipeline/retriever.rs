//! LeadFilter → SelectedLead

use super::{CandidateLead, LeadFilter, SelectedLead};
use crate::error::{LeadQualError, Result};
use crate::store::VectorStore;
use std::sync::Arc;

/// Result of retrieval and threshold selection
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Selected(SelectedLead),
    /// No candidate met the threshold. Not an error.
    NotFound,
}

/// Queries the vector store and selects the best lead
pub struct Retriever {
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    pub async fn retrieve(
        &self,
        filter: &LeadFilter,
        max_candidates: usize,
        min_relevance: f64,
    ) -> Result<Retrieval> {
        let query = filter.search_query();
        tracing::debug!("Searching leads for {:?}", query);

        let results = self
            .store
            .similarity_search(&query, max_candidates)
            .await
            .map_err(|e| LeadQualError::RetrievalUnavailable(e.to_string()))?;

        let candidates: Vec<CandidateLead> = results
            .into_iter()
            .map(|doc| {
                let source = doc.source().map(str::to_string);
                CandidateLead {
                    relevance_score: doc.score,
                    text: doc.content,
                    source,
                }
            })
            .collect();

        tracing::debug!(
            "Candidate scores: {:?}",
            candidates.iter().map(|c| c.relevance_score).collect::<Vec<_>>()
        );

        Ok(match select_best(candidates, min_relevance) {
            Some(lead) => Retrieval::Selected(lead.into()),
            None => Retrieval::NotFound,
        })
    }
}

/// Highest-scoring candidate at or above `min_relevance`.
///
/// Ties keep the earliest candidate. NaN scores never qualify.
pub fn select_best(candidates: Vec<CandidateLead>, min_relevance: f64) -> Option<CandidateLead> {
    candidates
        .into_iter()
        .filter(|c| c.relevance_score >= min_relevance)
        .fold(None, |best: Option<CandidateLead>, c| match best {
            Some(b) if b.relevance_score >= c.relevance_score => Some(b),
            _ => Some(c),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, ScoredDocument};
    use async_trait::async_trait;
    use proptest::prelude::*;

    fn candidates(scores: &[f64]) -> Vec<CandidateLead> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| CandidateLead::new(*s, format!("lead {}", i)))
            .collect()
    }

    #[test]
    fn test_select_best_picks_max() {
        let best = select_best(candidates(&[0.7, 0.9, 0.65]), 0.6).unwrap();
        assert_eq!(best.text, "lead 1");
    }

    #[test]
    fn test_select_best_tie_keeps_first() {
        let best = select_best(candidates(&[0.5, 0.8, 0.8]), 0.6).unwrap();
        assert_eq!(best.text, "lead 1");
    }

    #[test]
    fn test_select_best_threshold_inclusive() {
        assert!(select_best(candidates(&[0.6]), 0.6).is_some());
        assert!(select_best(candidates(&[0.59, 0.4]), 0.6).is_none());
        assert!(select_best(candidates(&[f64::NAN]), 0.6).is_none());
        assert!(select_best(Vec::new(), 0.6).is_none());
    }

    proptest! {
        #[test]
        fn prop_select_best_is_first_max_above_threshold(
            scores in prop::collection::vec(0.0f64..1.0, 0..8),
            threshold in 0.0f64..1.0,
        ) {
            let picked = select_best(candidates(&scores), threshold);
            let eligible: Vec<(usize, f64)> = scores
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, s)| *s >= threshold)
                .collect();

            match picked {
                None => prop_assert!(eligible.is_empty()),
                Some(lead) => {
                    let max = eligible.iter().map(|(_, s)| *s).fold(f64::MIN, f64::max);
                    let first = eligible.iter().find(|(_, s)| *s == max).map(|(i, _)| *i);
                    prop_assert_eq!(lead.relevance_score, max);
                    prop_assert_eq!(Some(lead.text), first.map(|i| format!("lead {}", i)));
                }
            }
        }
    }

    struct FailingStore;

    #[async_trait]
    impl VectorStore for FailingStore {
        async fn similarity_search(&self, _query: &str, _limit: usize) -> Result<Vec<ScoredDocument>> {
            Err(LeadQualError::Store("connection refused".into()))
        }

        async fn add_documents(&self, _docs: Vec<Document>) -> Result<usize> {
            Ok(0)
        }

        async fn remove_collection(&self) -> Result<usize> {
            Ok(0)
        }

        async fn count(&self) -> Result<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_retrieval_unavailable() {
        let retriever = Retriever::new(Arc::new(FailingStore));
        let err = retriever
            .retrieve(&LeadFilter::default(), 3, 0.6)
            .await
            .unwrap_err();
        assert!(matches!(err, LeadQualError::RetrievalUnavailable(_)));
    }
}
