use crate::config::types::Plan;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a crawl plan from the given path
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use gleaner::config::load_plan;
///
/// let plan = load_plan(Path::new("plan.toml")).unwrap();
/// println!("Seeds: {}", plan.seeds.len());
/// ```
pub fn load_plan(path: &Path) -> Result<Plan, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let plan: Plan = toml::from_str(&content)?;

    validate(&plan)?;

    Ok(plan)
}

/// Computes a SHA-256 hash of the plan file content
///
/// Logged at startup so a record stream can be traced back to the exact
/// plan that produced it.
pub fn compute_plan_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a plan and returns both the plan and its content hash
pub fn load_plan_with_hash(path: &Path) -> Result<(Plan, String), ConfigError> {
    let plan = load_plan(path)?;
    let hash = compute_plan_hash(path)?;
    Ok((plan, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_plan(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_plan() {
        let plan_content = r#"
[engine]
parallelism = 2
idle-timeout-ms = 1000
base-location = "https://example.com"

[[seeds]]
location = "/catalog"

[[seeds.rules]]
name = "items"
kind = "source"
selector = "a.item"

[[seeds.rules.rules]]
name = "title"
kind = "text"
selector = "h1"
"#;

        let file = create_temp_plan(plan_content);
        let plan = load_plan(file.path()).unwrap();

        assert_eq!(plan.engine.parallelism, 2);
        assert_eq!(plan.engine.idle_timeout_ms, 1000);
        assert_eq!(plan.seeds.len(), 1);
        assert_eq!(plan.seeds[0].rules.len(), 1);
    }

    #[test]
    fn test_load_plan_with_invalid_path() {
        let result = load_plan(Path::new("/nonexistent/plan.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_plan_with_invalid_toml() {
        let file = create_temp_plan("this is not valid TOML {{{");
        let result = load_plan(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_plan_with_validation_error() {
        let plan_content = r#"
[engine]
parallelism = 0

[[seeds]]
location = "https://example.com/"
"#;

        let file = create_temp_plan(plan_content);
        let result = load_plan(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_plan_hash() {
        let file = create_temp_plan("test content");

        let hash1 = compute_plan_hash(file.path()).unwrap();
        let hash2 = compute_plan_hash(file.path()).unwrap();

        // Same content should produce same hash
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_plan("content 1");
        let file2 = create_temp_plan("content 2");

        let hash1 = compute_plan_hash(file1.path()).unwrap();
        let hash2 = compute_plan_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
