//! Deterministic risk scoring.
//!
//! Scores are weighted sums of indicator conditions over a small feature
//! vector, clamped to [0,1] and banded into risk levels. The functions
//! here are pure: no I/O, no randomness, no failure modes — missing
//! inputs fall back to neutral values.

pub mod compare;
pub mod differential;
pub mod explain;
pub mod risk;

pub use compare::compare_checksums;
pub use differential::differential_for;
pub use risk::{assess, RiskAssessment};

use serde::{Deserialize, Serialize};

/// Feature vector for one assessment. Every field is optional on the
/// wire; absent values contribute nothing to the score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskFeatures {
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub aqi: Option<f64>,
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub years_exposure: Option<u32>,
    #[serde(default)]
    pub smoker: bool,
    #[serde(default)]
    pub family_history: bool,
}
