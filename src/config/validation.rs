use crate::config::types::{EngineSection, Plan, RuleEntry, RuleKindEntry, SeedEntry};
use crate::ConfigError;
use scraper::Selector;

/// Validates the entire crawl plan
pub fn validate(plan: &Plan) -> Result<(), ConfigError> {
    validate_engine_section(&plan.engine)?;

    if plan.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "plan must have at least one seed".to_string(),
        ));
    }

    for seed in &plan.seeds {
        validate_seed(seed)?;
    }

    Ok(())
}

fn validate_engine_section(engine: &EngineSection) -> Result<(), ConfigError> {
    if engine.parallelism < 1 {
        return Err(ConfigError::Validation(format!(
            "parallelism must be >= 1, got {}",
            engine.parallelism
        )));
    }

    if engine.idle_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "idle-timeout-ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_seed(seed: &SeedEntry) -> Result<(), ConfigError> {
    if seed.location.is_empty() {
        return Err(ConfigError::Validation(
            "seed location cannot be empty".to_string(),
        ));
    }

    validate_rules(&seed.rules)
}

fn validate_rules(rules: &[RuleEntry]) -> Result<(), ConfigError> {
    for rule in rules {
        validate_rule(rule)?;
    }
    Ok(())
}

fn validate_rule(rule: &RuleEntry) -> Result<(), ConfigError> {
    if rule.name.is_empty() {
        return Err(ConfigError::Validation(
            "rule name cannot be empty".to_string(),
        ));
    }

    match (&rule.selector, &rule.selectors) {
        (None, None) => {
            return Err(ConfigError::Validation(format!(
                "rule '{}' must set either 'selector' or 'selectors'",
                rule.name
            )));
        }
        (Some(_), Some(_)) => {
            return Err(ConfigError::Validation(format!(
                "rule '{}' sets both 'selector' and 'selectors'",
                rule.name
            )));
        }
        (Some(selector), None) => validate_selector(&rule.name, selector)?,
        (None, Some(selectors)) => {
            if selectors.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "rule '{}' has an empty 'selectors' list",
                    rule.name
                )));
            }
            for selector in selectors {
                validate_selector(&rule.name, selector)?;
            }
        }
    }

    match rule.kind {
        RuleKindEntry::Attribute => {
            // The engine skips an attribute rule with no attribute name;
            // surface the likely mistake at load time.
            if rule.attribute.is_none() {
                tracing::warn!(
                    "attribute rule '{}' has no 'attribute' and will never match",
                    rule.name
                );
            }
        }
        RuleKindEntry::Source => {
            match rule.rules.as_deref() {
                None | Some([]) => {
                    return Err(ConfigError::Validation(format!(
                        "source rule '{}' must have a nested 'rules' list",
                        rule.name
                    )));
                }
                Some(nested) => validate_rules(nested)?,
            }
        }
        RuleKindEntry::Text | RuleKindEntry::Image => {
            if rule.rules.is_some() {
                return Err(ConfigError::Validation(format!(
                    "only source rules may carry nested rules (rule '{}')",
                    rule.name
                )));
            }
        }
    }

    Ok(())
}

fn validate_selector(rule: &str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        rule: rule.to_string(),
        selector: selector.to_string(),
    })?;
    Ok(())
}
