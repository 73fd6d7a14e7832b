use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RiskLevel;

/// A stored risk prediction for one patient and condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub condition: String,
    pub score: f64,
    pub risk_level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub differential: Vec<DifferentialEntry>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

/// One triggered indicator with its contribution to the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub label: String,
    pub weight: f64,
    pub detail: String,
}

/// One alternative condition from the differential table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialEntry {
    pub condition: String,
    pub probability: f64,
}
