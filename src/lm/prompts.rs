//! Prompt templates for the analysis and baseline models.
//!
//! Templates are compiled in from `prompts/` and filled in a single pass, so
//! placeholder-looking text inside a diff is never expanded.
use crate::record::ImprovementCategory;
use regex::{Captures, Regex};
use std::sync::OnceLock;

const RECTIFY_SYSTEM: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/rectify_system.md"
));
const RECTIFY_USER: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/rectify_user.md"
));
const EVALUATE_SYSTEM: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/evaluate_system.md"
));
const EVALUATE_USER: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/evaluate_user.md"
));
const CLASSIFY_SYSTEM: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/classify_system.md"
));
const CLASSIFY_USER: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/classify_user.md"
));
pub(crate) const BASELINE_SYSTEM: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/baseline_system.md"
));

/// A system/user instruction pair sent to the analysis model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

pub fn rectify_prompt(diff: &str) -> PromptPair {
    PromptPair {
        system: RECTIFY_SYSTEM.trim().to_string(),
        user: render(RECTIFY_USER, &[("diff", diff)]),
    }
}

pub fn evaluate_prompt(diff: &str, message: &str) -> PromptPair {
    PromptPair {
        system: EVALUATE_SYSTEM.trim().to_string(),
        user: render(EVALUATE_USER, &[("diff", diff), ("message", message)]),
    }
}

pub fn classify_prompt(old_message: &str, new_message: &str) -> PromptPair {
    let categories = ImprovementCategory::OFFERED
        .iter()
        .map(|category| format!("\"{category}\""))
        .collect::<Vec<_>>()
        .join(", ");
    PromptPair {
        system: render(CLASSIFY_SYSTEM, &[("categories", &categories)]),
        user: render(
            CLASSIFY_USER,
            &[("old_message", old_message), ("new_message", new_message)],
        ),
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex is valid"))
}

fn render(template: &str, vars: &[(&str, &str)]) -> String {
    placeholder_regex()
        .replace_all(template.trim(), |caps: &Captures| {
            let name = &caps[1];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_prompt_fills_diff_and_message() {
        let prompt = evaluate_prompt("+x = 1", "fix: set x");
        assert!(prompt.user.contains("+x = 1"));
        assert!(prompt.user.contains("fix: set x"));
        assert!(!prompt.user.contains("{diff}"));
        assert!(prompt.system.contains("\"score\""));
    }

    #[test]
    fn placeholders_inside_values_are_not_expanded() {
        let prompt = evaluate_prompt("+print('{message}')", "fix: quoting");
        assert!(prompt.user.contains("+print('{message}')"));
    }

    #[test]
    fn classify_prompt_lists_offered_categories_only() {
        let prompt = classify_prompt("fixed stuff", "fix(parser): handle empty input");
        assert!(prompt.system.contains("\"no_improvement\""));
        assert!(!prompt.system.contains("unclassified"));
        assert!(prompt.user.contains("fixed stuff"));
    }
}
