//! Lead-qualification pipeline
//!
//! A free-text description flows through four stages:
//!
//! 1. [`FilterExtractor`] turns the description into a [`LeadFilter`]
//! 2. [`Retriever`] queries the vector store and selects the best lead above
//!    the relevance threshold
//! 3. [`Qualifier`] scores the lead and drafts an outreach email concurrently
//! 4. [`Orchestrator`] sequences the above and assembles the result
//!
//! Extraction and retrieval errors end the run. Scoring and drafting failures
//! are reported inline in the result.

mod extractor;
mod orchestrator;
mod qualifier;
mod retriever;

pub use extractor::FilterExtractor;
pub use orchestrator::{Orchestrator, Stage};
pub use qualifier::{Qualification, Qualifier};
pub use retriever::{select_best, Retrieval, Retriever};

use crate::config::PipelineSettings;
use crate::error::{LeadQualError, Result};
use crate::llm::extract_json_object;
use serde::{Deserialize, Deserializer, Serialize};

/// Structured search constraints extracted from a description.
///
/// Absent fields mean "no constraint". JSON `null`, missing keys and blank
/// strings all deserialize as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title_keywords: Vec<String>,
}

impl LeadFilter {
    /// Space-joined company, department and title keywords, in that order.
    ///
    /// An empty filter yields an empty query.
    pub fn search_query(&self) -> String {
        self.company
            .iter()
            .chain(self.department.iter())
            .chain(self.title_keywords.iter())
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.search_query().is_empty()
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(value
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// One retrieval result before threshold selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLead {
    pub relevance_score: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CandidateLead {
    pub fn new(relevance_score: f64, text: impl Into<String>) -> Self {
        Self {
            relevance_score,
            text: text.into(),
            source: None,
        }
    }
}

/// The single best candidate at or above the relevance threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedLead {
    #[serde(rename = "score")]
    pub relevance_score: f64,
    #[serde(rename = "lead_text")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<CandidateLead> for SelectedLead {
    fn from(candidate: CandidateLead) -> Self {
        Self {
            relevance_score: candidate.relevance_score,
            text: candidate.text,
            source: candidate.source,
        }
    }
}

/// Structured score parsed from the scoring answer when it is valid JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadScore {
    pub score: f64,
    #[serde(default)]
    pub justification: String,
}

impl LeadScore {
    /// Parse `{"score": .., "justification": ..}` out of a scoring answer
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(extract_json_object(text)?).ok()
    }
}

/// Outcome of a successful qualification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationResult {
    #[serde(rename = "top_lead")]
    pub selected_lead: SelectedLead,
    #[serde(rename = "lead_score")]
    pub score_justification: String,
    #[serde(rename = "prospect_email")]
    pub draft_email: String,
    #[serde(rename = "score", default, skip_serializing_if = "Option::is_none")]
    pub lead_score: Option<LeadScore>,
    #[serde(default)]
    pub filter: LeadFilter,
}

/// What a pipeline run produced
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Qualified(QualificationResult),
    /// No candidate met the relevance threshold
    NoRelevantLead,
}

impl PipelineOutcome {
    pub fn qualified(&self) -> Option<&QualificationResult> {
        match self {
            Self::Qualified(result) => Some(result),
            Self::NoRelevantLead => None,
        }
    }
}

/// Explicit pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub min_relevance: f64,
    pub max_candidates: usize,
    pub product_description: String,
}

impl PipelineConfig {
    pub fn new(product_description: impl Into<String>) -> Self {
        Self {
            min_relevance: crate::DEFAULT_MIN_RELEVANCE,
            max_candidates: crate::DEFAULT_MAX_CANDIDATES,
            product_description: product_description.into(),
        }
    }

    /// Build from settings, reading the product description from disk
    pub fn from_settings(settings: &PipelineSettings) -> Result<Self> {
        let product_description =
            std::fs::read_to_string(&settings.product_path).map_err(|e| {
                LeadQualError::Config(format!(
                    "cannot read product description {}: {}",
                    settings.product_path.display(),
                    e
                ))
            })?;
        if product_description.trim().is_empty() {
            return Err(LeadQualError::Config(format!(
                "product description {} is empty",
                settings.product_path.display()
            )));
        }
        Ok(Self {
            min_relevance: settings.min_relevance,
            max_candidates: settings.max_candidates,
            product_description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_filter_yields_empty_query() {
        assert_eq!(LeadFilter::default().search_query(), "");
        assert!(LeadFilter::default().is_empty());
    }

    #[test]
    fn test_search_query_order() {
        let filter = LeadFilter {
            company: Some("Acme".into()),
            department: Some("procurement".into()),
            title_keywords: vec!["buyer".into(), "manager".into()],
        };
        assert_eq!(filter.search_query(), "Acme procurement buyer manager");
    }

    #[test]
    fn test_filter_nulls_and_blanks_are_absent() {
        let filter: LeadFilter =
            serde_json::from_str(r#"{"company": null, "department": "  ", "title_keywords": null}"#)
                .unwrap();
        assert_eq!(filter, LeadFilter::default());

        let filter: LeadFilter = serde_json::from_str(r#"{"title_keywords": ["cto", ""]}"#).unwrap();
        assert_eq!(filter.title_keywords, vec!["cto"]);
        assert_eq!(filter.company, None);
    }

    #[test]
    fn test_lead_score_parse() {
        let score = LeadScore::parse("```json\n{\"score\": 8, \"justification\": \"big team\"}\n```")
            .unwrap();
        assert_eq!(score.score, 8.0);
        assert_eq!(score.justification, "big team");
        assert!(LeadScore::parse("Score: 8").is_none());
    }

    #[test]
    fn test_result_serializes_front_end_shape() {
        let result = QualificationResult {
            selected_lead: SelectedLead {
                relevance_score: 0.82,
                text: "Jane Doe, Acme".into(),
                source: None,
            },
            score_justification: "{\"score\": 8}".into(),
            draft_email: "Hi Jane".into(),
            lead_score: None,
            filter: LeadFilter::default(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["top_lead"]["score"], 0.82);
        assert_eq!(json["top_lead"]["lead_text"], "Jane Doe, Acme");
        assert_eq!(json["lead_score"], "{\"score\": 8}");
        assert_eq!(json["prospect_email"], "Hi Jane");
    }

    #[test]
    fn test_config_from_settings() {
        let dir = TempDir::new().unwrap();
        let product = dir.path().join("product.md");
        std::fs::write(&product, "ProcureX: procurement automation").unwrap();

        let settings = PipelineSettings {
            product_path: product,
            ..PipelineSettings::default()
        };
        let config = PipelineConfig::from_settings(&settings).unwrap();
        assert_eq!(config.product_description, "ProcureX: procurement automation");
        assert_eq!(config.min_relevance, crate::DEFAULT_MIN_RELEVANCE);

        let missing = PipelineSettings {
            product_path: dir.path().join("nope.md"),
            ..PipelineSettings::default()
        };
        assert!(matches!(
            PipelineConfig::from_settings(&missing),
            Err(LeadQualError::Config(_))
        ));
    }
}
