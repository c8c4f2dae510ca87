//! Core data model: extraction rules, crawl work items, and engine options.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How a rule locates elements in a parsed document.
#[derive(Debug, Clone)]
pub enum SelectorSpec {
    /// A single CSS selector.
    Single(String),
    /// Ordered fallback selectors; the first one with a non-empty match
    /// set wins, regardless of how many earlier ones missed.
    AnyOf(Vec<String>),
}

/// What a rule does with its matched elements.
///
/// The set of kinds is closed; the evaluator matches on it exhaustively.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Store the first match's text content (markup stripped, entities
    /// decoded, surrounding whitespace trimmed).
    Text,
    /// Store the named attribute of the first match, if present. A rule
    /// configured without an attribute name is skipped.
    Attribute { attribute: Option<String> },
    /// Download every match's `src` target and store the local file names
    /// joined by `"; "`.
    Image,
    /// Follow every match's `href`, applying the nested rules to each
    /// discovered page. Items carrying a Source rule are traversal hops:
    /// their own content is never flushed.
    Source { rules: Arc<[Rule]> },
}

/// A single extraction rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Field name the rule writes; for Source rules, a label used in
    /// diagnostics only.
    pub name: String,
    pub selector: SelectorSpec,
    pub kind: RuleKind,
}

impl Rule {
    pub fn text(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: SelectorSpec::Single(selector.into()),
            kind: RuleKind::Text,
        }
    }

    pub fn attribute(
        name: impl Into<String>,
        selector: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            selector: SelectorSpec::Single(selector.into()),
            kind: RuleKind::Attribute {
                attribute: Some(attribute.into()),
            },
        }
    }

    pub fn image(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: SelectorSpec::Single(selector.into()),
            kind: RuleKind::Image,
        }
    }

    pub fn source(
        name: impl Into<String>,
        selector: impl Into<String>,
        rules: impl Into<Arc<[Rule]>>,
    ) -> Self {
        Self {
            name: name.into(),
            selector: SelectorSpec::Single(selector.into()),
            kind: RuleKind::Source {
                rules: rules.into(),
            },
        }
    }

    /// Replaces the single selector with an ordered fallback list.
    pub fn with_selectors(mut self, selectors: Vec<String>) -> Self {
        self.selector = SelectorSpec::AnyOf(selectors);
        self
    }
}

/// One unit of crawl work: a location, the rule set to apply to it, and
/// the fields accumulated so far.
#[derive(Debug)]
pub struct WorkItem {
    /// Target location. Rewritten in place to an absolute form immediately
    /// before fetch; a child inherits no normalization until its own turn.
    pub location: String,
    /// Shared, immutable rule set. Never mutated after construction; many
    /// items discovered by the same Source rule point at one allocation.
    pub rules: Arc<[Rule]>,
    /// Extracted fields. The last write for a given name wins.
    pub content: HashMap<String, String>,
    /// Location of the page that discovered this item. Lineage for
    /// diagnostics only; never consulted for cycle detection.
    pub parent: Option<String>,
}

impl WorkItem {
    /// Creates a caller-supplied seed item.
    pub fn seed(location: impl Into<String>, rules: impl Into<Arc<[Rule]>>) -> Self {
        Self {
            location: location.into(),
            rules: rules.into(),
            content: HashMap::new(),
            parent: None,
        }
    }

    /// Creates an item discovered during evaluation of `parent`.
    pub(crate) fn child(location: String, rules: Arc<[Rule]>, parent: &WorkItem) -> Self {
        Self {
            location,
            rules,
            content: HashMap::new(),
            parent: Some(parent.location.clone()),
        }
    }

    /// An item whose rule set contains no Source rule is terminal: its
    /// content is flushed to the record sink once evaluation completes.
    pub fn is_terminal(&self) -> bool {
        !self
            .rules
            .iter()
            .any(|rule| matches!(rule.kind, RuleKind::Source { .. }))
    }
}

/// Tuning for the crawl engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Number of concurrent workers. At least 1.
    pub parallelism: usize,
    /// How long a worker waits on an empty frontier before concluding the
    /// crawl is complete. Choose this comfortably above per-page fetch
    /// latency: the pool can otherwise shut down while a slow fetch is
    /// about to enqueue more work, and those items are lost.
    pub idle_timeout: Duration,
    /// Optional prefix applied to locations that do not already start
    /// with it, immediately before fetch.
    pub base_location: Option<String>,
    /// Directory for downloaded resources. Defaults to the working
    /// directory.
    pub resource_dir: Option<PathBuf>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            parallelism: 4,
            idle_timeout: Duration::from_secs(5),
            base_location: None,
            resource_dir: None,
        }
    }
}
