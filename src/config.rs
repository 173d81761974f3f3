//! Engine configuration
//!
//! Loaded from a JSON file (every field optional) and then overridden from
//! `NLQ_*` environment variables.

use crate::error::{NlqError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Thresholds and scores used when matching tokens against schema names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// A table is only selected when its best score exceeds this
    pub table_threshold: f64,
    /// A column is only accepted when its score exceeds this
    pub column_threshold: f64,
    /// Edit-distance matching is attempted when the lexical score is below this
    pub fuzzy_threshold: f64,
    /// Score given to a table reached by edit distance
    pub fuzzy_table_score: f64,
    /// Score given to a column reached by edit distance
    pub fuzzy_column_score: f64,
    /// Names up to this many characters count as short
    pub short_name_len: usize,
    /// Edits tolerated for short names
    pub short_name_max_edits: usize,
    /// Edits tolerated for longer names
    pub long_name_max_edits: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            table_threshold: 0.6,
            column_threshold: 0.7,
            fuzzy_threshold: 0.8,
            fuzzy_table_score: 0.85,
            fuzzy_column_score: 0.8,
            short_name_len: 4,
            short_name_max_edits: 1,
            long_name_max_edits: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Database used when a request names none
    pub default_database: String,
    /// Maximum age of a cached schema snapshot, in seconds
    pub schema_ttl_secs: u64,
    /// Substitute the built-in example schema when discovery finds no tables
    pub use_fallback_schema: bool,
    /// Extra term -> canonical term entries merged into the synonym table
    pub extra_synonyms: HashMap<String, String>,
    pub matching: MatchingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_database: "engdb".to_string(),
            schema_ttl_secs: 60 * 60,
            use_fallback_schema: true,
            extra_synonyms: HashMap::new(),
            matching: MatchingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `NLQ_DEFAULT_DATABASE`, `NLQ_SCHEMA_TTL_SECS` and
    /// `NLQ_USE_FALLBACK_SCHEMA` overrides from the environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup("NLQ_DEFAULT_DATABASE") {
            if !db.trim().is_empty() {
                self.default_database = db.trim().to_string();
            }
        }
        if let Some(ttl) = lookup("NLQ_SCHEMA_TTL_SECS") {
            self.schema_ttl_secs = ttl.trim().parse().map_err(|_| {
                NlqError::Config(format!("NLQ_SCHEMA_TTL_SECS is not a number: {}", ttl))
            })?;
        }
        if let Some(flag) = lookup("NLQ_USE_FALLBACK_SCHEMA") {
            self.use_fallback_schema = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(NlqError::Config(format!(
                        "NLQ_USE_FALLBACK_SCHEMA must be a boolean, got {}",
                        other
                    )))
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_database.trim().is_empty() {
            return Err(NlqError::Config("default_database must not be empty".to_string()));
        }
        let m = &self.matching;
        for (name, value) in [
            ("table_threshold", m.table_threshold),
            ("column_threshold", m.column_threshold),
            ("fuzzy_threshold", m.fuzzy_threshold),
            ("fuzzy_table_score", m.fuzzy_table_score),
            ("fuzzy_column_score", m.fuzzy_column_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(NlqError::Config(format!(
                    "matching.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn schema_ttl(&self) -> chrono::Duration {
        // chrono durations top out at i64::MAX milliseconds
        chrono::Duration::seconds(self.schema_ttl_secs.min((i64::MAX / 1_000) as u64) as i64)
    }
}
