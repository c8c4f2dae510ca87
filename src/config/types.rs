use crate::rules::{EngineOptions, Rule, RuleKind, SelectorSpec, WorkItem};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A crawl plan: engine options plus seed locations with their rule trees.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub seeds: Vec<SeedEntry>,
}

/// Engine tuning section
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Number of concurrent workers
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Worker idle timeout in milliseconds
    #[serde(rename = "idle-timeout-ms", default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Prefix applied to relative seed and discovered locations
    #[serde(rename = "base-location")]
    pub base_location: Option<String>,

    /// Directory downloaded resources are stored in
    #[serde(rename = "resource-dir")]
    pub resource_dir: Option<String>,
}

fn default_parallelism() -> usize {
    4
}

fn default_idle_timeout_ms() -> u64 {
    5000
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            idle_timeout_ms: default_idle_timeout_ms(),
            base_location: None,
            resource_dir: None,
        }
    }
}

/// One seed location and the rules applied to it
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub location: String,
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

/// One rule table. `kind` selects the behavior; `attribute` applies to
/// attribute rules and the nested `rules` list to source rules. Exactly
/// one of `selector` and `selectors` must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleEntry {
    pub name: String,
    pub kind: RuleKindEntry,
    pub selector: Option<String>,
    pub selectors: Option<Vec<String>>,
    pub attribute: Option<String>,
    pub rules: Option<Vec<RuleEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKindEntry {
    Text,
    Attribute,
    Image,
    Source,
}

impl Plan {
    /// Engine options for this plan.
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            parallelism: self.engine.parallelism,
            idle_timeout: Duration::from_millis(self.engine.idle_timeout_ms),
            base_location: self.engine.base_location.clone(),
            resource_dir: self.engine.resource_dir.as_ref().map(PathBuf::from),
        }
    }

    /// Seed work items for this plan. Each seed's rule tree is built once;
    /// nested source rule sets end up shared across the children they
    /// discover.
    pub fn seed_items(&self) -> Vec<WorkItem> {
        self.seeds
            .iter()
            .map(|seed| WorkItem::seed(seed.location.clone(), build_rules(&seed.rules)))
            .collect()
    }
}

fn build_rules(entries: &[RuleEntry]) -> Arc<[Rule]> {
    entries.iter().map(build_rule).collect::<Vec<_>>().into()
}

fn build_rule(entry: &RuleEntry) -> Rule {
    let selector = match (&entry.selector, &entry.selectors) {
        (Some(selector), _) => SelectorSpec::Single(selector.clone()),
        (None, Some(selectors)) => SelectorSpec::AnyOf(selectors.clone()),
        // Rejected by validation; an empty selector matches nothing.
        (None, None) => SelectorSpec::Single(String::new()),
    };

    let kind = match entry.kind {
        RuleKindEntry::Text => RuleKind::Text,
        RuleKindEntry::Attribute => RuleKind::Attribute {
            attribute: entry.attribute.clone(),
        },
        RuleKindEntry::Image => RuleKind::Image,
        RuleKindEntry::Source => RuleKind::Source {
            rules: build_rules(entry.rules.as_deref().unwrap_or(&[])),
        },
    };

    Rule {
        name: entry.name.clone(),
        selector,
        kind,
    }
}
