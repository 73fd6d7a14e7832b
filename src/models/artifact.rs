use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ArtifactKind;

/// Metadata for an uploaded case file. Contents are not retained —
/// only the SHA-256 checksum used for comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseArtifact {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub file_name: String,
    pub kind: ArtifactKind,
    pub byte_size: u64,
    pub checksum: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Stored result of comparing two artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub id: Uuid,
    pub left_artifact_id: Uuid,
    pub right_artifact_id: Uuid,
    pub similarity: f64,
    pub regions: Vec<Region>,
    pub compared_at: DateTime<Utc>,
}

/// One highlighted cell on the 8×8 comparison grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub row: u8,
    pub col: u8,
    pub intensity: u8,
}
