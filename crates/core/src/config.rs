use crate::error::{Result, TracescopeError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the optional per-project configuration file.
pub const CONFIG_FILE_NAME: &str = ".tracescope.json";

/// Engine-wide knobs. Every field has a default so a partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Directory names whose contents are never user code.
    pub vendor_dirs: Vec<String>,
    /// Regexes matched against root-relative paths to flag test files.
    pub test_file_patterns: Vec<String>,
    /// Upper bound on dependency files pulled in while linking imports.
    pub max_external_files: usize,
    pub dead_code_timeout_ms: u64,
    pub dead_code_max_results: usize,
    pub hierarchy_timeout_ms: u64,
    pub reference_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vendor_dirs: vec![
                "node_modules".to_string(),
                "bower_components".to_string(),
                "jspm_packages".to_string(),
            ],
            test_file_patterns: vec![
                r"\.(test|spec)\.[cm]?[jt]sx?$".to_string(),
                r"(^|/)(__tests__|__mocks__)/".to_string(),
                r"(^|/)tests?/".to_string(),
            ],
            max_external_files: 2000,
            dead_code_timeout_ms: 30_000,
            dead_code_max_results: 500,
            hierarchy_timeout_ms: 10_000,
            reference_timeout_ms: 20_000,
        }
    }
}

impl EngineConfig {
    /// Loads `<root>/.tracescope.json` (JSON5) if present, else defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        let config: EngineConfig = json5::from_str(&text)
            .map_err(|e| TracescopeError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn test_matcher(&self) -> TestFileMatcher {
        TestFileMatcher::new(&self.test_file_patterns)
    }

    pub fn is_vendor_dir(&self, name: &str) -> bool {
        self.vendor_dirs.iter().any(|d| d == name)
    }
}

/// Compiled test-file naming convention.
#[derive(Debug, Clone)]
pub struct TestFileMatcher {
    patterns: Vec<Regex>,
}

impl TestFileMatcher {
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!("ignoring invalid test file pattern '{}': {}", p, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_test_file(&self, rel_path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(rel_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_test_patterns() {
        let matcher = EngineConfig::default().test_matcher();
        assert!(matcher.is_test_file("src/user.test.ts"));
        assert!(matcher.is_test_file("src/__tests__/user.ts"));
        assert!(matcher.is_test_file("tests/user.ts"));
        assert!(matcher.is_test_file("src/api.spec.tsx"));
        assert!(!matcher.is_test_file("src/user.ts"));
        assert!(!matcher.is_test_file("src/contest.ts"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "{ // comment\n maxExternalFiles: 10, }",
        )
        .unwrap();
        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.max_external_files, 10);
        assert_eq!(config.dead_code_max_results, 500);
        assert!(config.is_vendor_dir("node_modules"));
    }
}
