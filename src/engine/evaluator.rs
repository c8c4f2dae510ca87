//! Rule evaluation: turns a parsed document into planned extraction steps.
//!
//! Evaluation is pure: it reads the document, never performs I/O, and
//! returns the steps to execute in rule order. The worker replays the plan
//! afterwards (field writes, image downloads, child enqueues), which keeps
//! the non-`Send` [`Html`] handle out of await scopes and makes every rule
//! behavior testable without a network.

use crate::rules::{Rule, RuleKind, SelectorSpec};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;

/// One planned step. Steps appear in rule order.
#[derive(Debug)]
pub enum Step {
    /// Store a field extracted directly from the document.
    Field { name: String, value: String },
    /// Download each source; store the successful file names joined by
    /// `"; "` if any succeed.
    Images { name: String, sources: Vec<String> },
    /// Enqueue the discovered children.
    Discover(Vec<Discovery>),
}

/// A child page discovered by a Source rule.
#[derive(Debug)]
pub struct Discovery {
    pub location: String,
    /// The Source rule's nested rule set, shared across all its children.
    pub rules: Arc<[Rule]>,
}

/// Outcome of evaluating a rule set against one document.
#[derive(Debug)]
pub struct Evaluation {
    pub steps: Vec<Step>,
    /// True when the rule set contains no Source rule. Terminal items have
    /// their accumulated content flushed to the record sink; non-terminal
    /// items are traversal hops and are never flushed.
    pub terminal: bool,
}

/// Applies each rule in order to the parsed document.
///
/// A rule whose selector matches nothing is skipped without error, as is
/// an Attribute rule whose attribute is missing from the matched element.
pub fn evaluate(document: &Html, rules: &[Rule]) -> Evaluation {
    let mut steps = Vec::new();

    for rule in rules {
        let elements = resolve_selector(document, &rule.selector);
        if elements.is_empty() {
            continue;
        }

        match &rule.kind {
            RuleKind::Text => {
                steps.push(Step::Field {
                    name: rule.name.clone(),
                    value: element_text(&elements[0]),
                });
            }

            RuleKind::Attribute { attribute } => {
                let Some(attribute) = attribute else {
                    continue;
                };
                if let Some(value) = elements[0].value().attr(attribute) {
                    steps.push(Step::Field {
                        name: rule.name.clone(),
                        value: value.to_string(),
                    });
                }
            }

            RuleKind::Image => {
                let sources: Vec<String> = elements
                    .iter()
                    .filter_map(|element| element.value().attr("src"))
                    .filter(|src| !src.is_empty())
                    .map(str::to_string)
                    .collect();
                if !sources.is_empty() {
                    steps.push(Step::Images {
                        name: rule.name.clone(),
                        sources,
                    });
                }
            }

            RuleKind::Source { rules: nested } => {
                let mut discoveries = Vec::new();
                for element in &elements {
                    // An element without an href abandons the remaining
                    // elements of this match set.
                    let Some(href) = element.value().attr("href") else {
                        break;
                    };
                    if href.is_empty() {
                        continue;
                    }
                    discoveries.push(Discovery {
                        location: href.to_string(),
                        rules: Arc::clone(nested),
                    });
                }
                if !discoveries.is_empty() {
                    steps.push(Step::Discover(discoveries));
                }
            }
        }
    }

    let terminal = !rules
        .iter()
        .any(|rule| matches!(rule.kind, RuleKind::Source { .. }));

    Evaluation { steps, terminal }
}

/// Resolves a selector spec to its match set: a single selector selects
/// directly; a fallback list returns the first non-empty match set.
fn resolve_selector<'a>(document: &'a Html, spec: &SelectorSpec) -> Vec<ElementRef<'a>> {
    match spec {
        SelectorSpec::Single(selector) => select_all(document, selector),
        SelectorSpec::AnyOf(selectors) => {
            for selector in selectors {
                let matched = select_all(document, selector);
                if !matched.is_empty() {
                    return matched;
                }
            }
            Vec::new()
        }
    }
}

fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(parsed) => document.select(&parsed).collect(),
        Err(_) => {
            tracing::debug!("ignoring unparseable selector: {}", selector);
            Vec::new()
        }
    }
}

/// Text content of an element's subtree: markup stripped, entities decoded
/// by the parser, surrounding whitespace trimmed.
fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
