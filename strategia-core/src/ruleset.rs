//! Versioned rule sets: the scenario table plus the tactical table.
//!
//! A rule set is loaded from TOML, validated once, and fingerprinted with a
//! BLAKE3 hash of its canonical JSON form. Evaluations only ever see a fully
//! validated, immutable `RuleSet`; replacing rules means building a new one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decision::RuleSetStamp;
use crate::range::RangeError;
use crate::scenario::defaults::{builtin_scenarios, BUILTIN_EXPECTED_SCENARIOS};
use crate::scenario::{MatrixValidation, ScenarioDefinition, ScenarioMatrix};
use crate::snapshot::Indicator;
use crate::tactical::defaults::builtin_tactical;
use crate::tactical::{TacticalMatrix, TacticalRule};

pub const BUILTIN_VERSION: &str = "builtin-5.0";

/// Errors from loading or validating a rule set.
#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("failed to read rule set {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rule set: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize rule set: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("rule set version must not be empty")]
    MissingVersion,
    #[error("scenario '{scenario_id}' has an invalid range on '{field}': {reason}")]
    InvalidCondition {
        scenario_id: String,
        field: Indicator,
        reason: RangeError,
    },
    #[error("duplicate scenario id '{id}'")]
    DuplicateScenario { id: String },
    #[error("override scenario '{id}' must have priority 0, found {priority}")]
    OverridePriority { id: String, priority: u32 },
    #[error("scenario '{id}' uses priority 0, which is reserved for override scenarios")]
    ReservedPriority { id: String },
    #[error("scenario '{id}' size {size} is outside [0, 100]")]
    ScenarioSize { id: String, size: f64 },
    #[error("tactical rule '{rule_id}' has an invalid {axis} range: {reason}")]
    InvalidTacticalRange {
        rule_id: String,
        axis: &'static str,
        reason: RangeError,
    },
    #[error("duplicate tactical rule id '{id}'")]
    DuplicateTacticalRule { id: String },
    #[error("tactical rule '{id}' size {size} is outside [0, 100]")]
    TacticalSize { id: String, size: f64 },
    #[error("tactical table has no catch-all row (open ranges, HOLD, 0%)")]
    MissingCatchAll,
}

/// On-disk shape of a rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetDocument {
    pub version: String,
    #[serde(default = "default_expected_scenarios")]
    pub expected_scenarios: usize,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDefinition>,
    #[serde(default)]
    pub tactical: Vec<TacticalRule>,
}

fn default_expected_scenarios() -> usize {
    BUILTIN_EXPECTED_SCENARIOS
}

/// A validated, fingerprinted rule set.
#[derive(Debug, Clone)]
pub struct RuleSet {
    document: RuleSetDocument,
    scenarios: ScenarioMatrix,
    tactical: TacticalMatrix,
    hash: String,
}

impl RuleSet {
    pub fn from_document(document: RuleSetDocument) -> Result<Self, RuleSetError> {
        if document.version.trim().is_empty() {
            return Err(RuleSetError::MissingVersion);
        }
        let scenarios = ScenarioMatrix::new(document.scenarios.clone())?;
        let tactical = TacticalMatrix::new(document.tactical.clone())?;
        let hash = content_hash(&document);
        Ok(Self {
            document,
            scenarios,
            tactical,
            hash,
        })
    }

    /// Parse and validate a TOML rule set.
    pub fn from_toml(content: &str) -> Result<Self, RuleSetError> {
        let document: RuleSetDocument = toml::from_str(content)?;
        Self::from_document(document)
    }

    /// Load a rule set from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuleSetError> {
        let content = std::fs::read_to_string(path).map_err(|source| RuleSetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// The production scenario and tactical tables.
    pub fn builtin() -> Self {
        let document = RuleSetDocument {
            version: BUILTIN_VERSION.to_string(),
            expected_scenarios: BUILTIN_EXPECTED_SCENARIOS,
            scenarios: builtin_scenarios(),
            tactical: builtin_tactical(),
        };
        Self::from_document(document).expect("built-in rule set must validate")
    }

    pub fn to_toml(&self) -> Result<String, RuleSetError> {
        Ok(toml::to_string_pretty(&self.document)?)
    }

    pub fn version(&self) -> &str {
        &self.document.version
    }

    /// Hex BLAKE3 hash of the canonical document.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn stamp(&self) -> RuleSetStamp {
        RuleSetStamp {
            version: self.document.version.clone(),
            hash: self.hash.clone(),
        }
    }

    pub fn document(&self) -> &RuleSetDocument {
        &self.document
    }

    pub fn scenarios(&self) -> &ScenarioMatrix {
        &self.scenarios
    }

    pub fn tactical(&self) -> &TacticalMatrix {
        &self.tactical
    }

    pub fn expected_scenarios(&self) -> usize {
        self.document.expected_scenarios
    }

    /// Scenario counts per group against the expected total.
    pub fn validate_scenario_matrix(&self) -> MatrixValidation {
        MatrixValidation::of(&self.document.scenarios, self.document.expected_scenarios)
    }
}

fn content_hash(document: &RuleSetDocument) -> String {
    // Struct field order is fixed, so the JSON form is canonical.
    let json = serde_json::to_string(document).expect("RuleSetDocument must serialize");
    blake3::hash(json.as_bytes()).to_hex().to_string()
}
