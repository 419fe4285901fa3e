//! Roast API Types
//!
//! Wire types for the RoastMyStartup HTTP API. Field names match the JSON
//! bodies exactly, so every struct here derives serde without renames.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Health marker reported by a warmed-up service
pub const ALIVE: &str = "alive";

/// Intensity of the generated roast
///
/// Serialized as `"Soft"`, `"Medium"` or `"Nuclear"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum RoastLevel {
    /// Constructive and gentle
    Soft,
    /// Blunt, VC-style
    #[default]
    Medium,
    /// No mercy
    Nuclear,
}

impl RoastLevel {
    /// All levels, mildest first
    pub const ALL: [RoastLevel; 3] = [RoastLevel::Soft, RoastLevel::Medium, RoastLevel::Nuclear];

    /// Wire name of the level
    pub fn as_str(&self) -> &'static str {
        match self {
            RoastLevel::Soft => "Soft",
            RoastLevel::Medium => "Medium",
            RoastLevel::Nuclear => "Nuclear",
        }
    }
}

impl fmt::Display for RoastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unknown roast level '{0}' (expected soft, medium or nuclear)")]
pub struct ParseRoastLevelError(String);

impl FromStr for RoastLevel {
    type Err = ParseRoastLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(RoastLevel::Soft),
            "medium" => Ok(RoastLevel::Medium),
            "nuclear" => Ok(RoastLevel::Nuclear),
            _ => Err(ParseRoastLevelError(s.to_string())),
        }
    }
}

/// A startup submitted for roasting
///
/// Endpoint: POST /roast (request body)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoastRequest {
    pub startup_name: String,
    pub idea_description: String,
    pub target_users: String,
    pub budget: String,
    pub roast_level: RoastLevel,
}

/// A field of [`RoastRequest`] that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} must be between {min} and {max} characters (got {actual})")]
pub struct ValidationError {
    pub field: &'static str,
    pub min: usize,
    pub max: usize,
    pub actual: usize,
}

/// Length limits enforced by the service, in characters
const FIELD_LIMITS: [(&str, usize, usize); 4] = [
    ("startup_name", 1, 100),
    ("idea_description", 10, 2000),
    ("target_users", 5, 500),
    ("budget", 1, 50),
];

impl RoastRequest {
    pub fn new(
        startup_name: impl Into<String>,
        idea_description: impl Into<String>,
        target_users: impl Into<String>,
        budget: impl Into<String>,
        roast_level: RoastLevel,
    ) -> Self {
        Self {
            startup_name: startup_name.into(),
            idea_description: idea_description.into(),
            target_users: target_users.into(),
            budget: budget.into(),
            roast_level,
        }
    }

    /// Check field lengths against the limits the service enforces
    ///
    /// Returns every violation, not just the first. Lengths are counted in
    /// characters on the raw value, whitespace included.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let values = [
            &self.startup_name,
            &self.idea_description,
            &self.target_users,
            &self.budget,
        ];

        let errors: Vec<ValidationError> = FIELD_LIMITS
            .iter()
            .zip(values)
            .filter_map(|(&(field, min, max), value)| {
                let actual = value.chars().count();
                (actual < min || actual > max).then_some(ValidationError {
                    field,
                    min,
                    max,
                    actual,
                })
            })
            .collect();

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Generated roast
///
/// Endpoint: POST /roast (response body)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoastResponse {
    pub brutal_roast: String,
    pub honest_feedback: String,
    pub competitor_reality_check: String,
    pub pitch_rewrite: String,
    pub survival_tips: Vec<String>,
}

impl fmt::Display for RoastResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            ("Brutal Roast", &self.brutal_roast),
            ("Honest Feedback", &self.honest_feedback),
            ("Competitor Reality Check", &self.competitor_reality_check),
            ("Pitch Rewrite", &self.pitch_rewrite),
        ];

        for (title, body) in sections {
            writeln!(f, "== {title} ==")?;
            writeln!(f, "{}", body.trim())?;
            writeln!(f)?;
        }

        writeln!(f, "== Survival Tips ==")?;
        for (i, tip) in self.survival_tips.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, tip.trim())?;
        }
        Ok(())
    }
}

/// Service health
///
/// Endpoint: GET /health
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `"alive"` once the service can take requests
    pub status: String,
    /// Text-generation model in use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Persistence health ("healthy" or "unavailable")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl HealthStatus {
    pub fn is_alive(&self) -> bool {
        self.status == ALIVE
    }
}

/// Aggregate roast counts
///
/// Endpoint: GET /stats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoastStats {
    pub total_roasts: u64,
    /// Count per level, keyed by wire name ("Soft", "Medium", "Nuclear")
    #[serde(default)]
    pub roast_levels: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl RoastStats {
    /// Count for a single level, zero when the service omitted it
    pub fn count(&self, level: RoastLevel) -> u64 {
        self.roast_levels.get(level.as_str()).copied().unwrap_or(0)
    }
}
