//! Prompt templates with named `{{variable}}` placeholders

use super::{ChatMessage, CompletionOptions, LLMClient};
use crate::error::Result;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    // `{{name}}` and the Go-template style `{{.name}}` are both accepted
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap();
}

/// Variable bindings for a prompt template
pub type PromptVars<'a> = HashMap<&'a str, &'a str>;

/// Substitute every placeholder whose name is bound in `vars`.
///
/// Substitution is a single pass, so braces inside bound values are never
/// re-expanded. Placeholders without a binding are left as written.
pub fn render_template(template: &str, vars: &PromptVars<'_>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => (*value).to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Names of all placeholders in a template, in order of first appearance
pub fn template_variables(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Render a template and send it as a single user turn
pub async fn run_prompt(
    client: &dyn LLMClient,
    template: &str,
    vars: &PromptVars<'_>,
    options: &CompletionOptions,
) -> Result<String> {
    let missing: Vec<String> = template_variables(template)
        .into_iter()
        .filter(|name| !vars.contains_key(name.as_str()))
        .collect();
    if !missing.is_empty() {
        tracing::warn!("Prompt rendered with unbound placeholders: {:?}", missing);
    }

    let prompt = render_template(template, vars);
    client
        .chat_completion_with(vec![ChatMessage::user(prompt)], options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_both_placeholder_styles() {
        let vars = PromptVars::from([("lead", "Jane Doe"), ("product", "ProcureX")]);
        let out = render_template("Sell {{product}} to {{.lead}}.", &vars);
        assert_eq!(out, "Sell ProcureX to Jane Doe.");
    }

    #[test]
    fn test_unbound_placeholder_left_alone() {
        let vars = PromptVars::from([("input", "buyer at Acme")]);
        let out = render_template("{{input}} / {{other}}", &vars);
        assert_eq!(out, "buyer at Acme / {{other}}");
    }

    #[test]
    fn test_values_are_not_reexpanded() {
        let vars = PromptVars::from([("lead", "{{product}}"), ("product", "X")]);
        let out = render_template("{{lead}}", &vars);
        assert_eq!(out, "{{product}}");
    }

    #[test]
    fn test_template_variables_dedup() {
        let names = template_variables("{{a}} {{ .b }} {{a}}");
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
