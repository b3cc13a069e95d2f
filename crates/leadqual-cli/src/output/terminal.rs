//! Terminal output formatter

use leadqual_core::QualificationResult;

pub fn format_qualification(result: &QualificationResult) -> String {
    let lead = &result.selected_lead;
    let mut output = String::new();

    let score_pct = (lead.relevance_score * 100.0).round() as u32;
    match &lead.source {
        Some(source) => output.push_str(&format!("Top lead ({:>3}% match, {})\n", score_pct, source)),
        None => output.push_str(&format!("Top lead ({:>3}% match)\n", score_pct)),
    }
    for line in lead.text.lines() {
        output.push_str(&format!("  {}\n", line));
    }

    output.push('\n');
    match &result.lead_score {
        Some(score) => output.push_str(&format!(
            "Lead score: {}/10  {}\n",
            score.score, score.justification
        )),
        None => output.push_str(&format!("Lead score: {}\n", result.score_justification.trim())),
    }

    output.push_str("\nDraft email:\n");
    for line in result.draft_email.trim().lines() {
        output.push_str(&format!("  {}\n", line));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadqual_core::pipeline::{LeadScore, SelectedLead};
    use leadqual_core::LeadFilter;

    #[test]
    fn test_format_qualification() {
        let result = QualificationResult {
            selected_lead: SelectedLead {
                relevance_score: 0.82,
                text: "Jane Doe\nProcurement, Acme".into(),
                source: Some("leads.md".into()),
            },
            score_justification: "{}".into(),
            draft_email: "Hi Jane,\nThanks.".into(),
            lead_score: Some(LeadScore {
                score: 8.0,
                justification: "large team".into(),
            }),
            filter: LeadFilter::default(),
        };
        let out = format_qualification(&result);
        assert!(out.starts_with("Top lead ( 82% match, leads.md)"));
        assert!(out.contains("  Procurement, Acme\n"));
        assert!(out.contains("Lead score: 8/10  large team"));
        assert!(out.contains("Draft email:\n  Hi Jane,\n  Thanks.\n"));
    }
}
