use serde::{Deserialize, Serialize};

use crate::models::{DifferentialEntry, RiskFactor, RiskLevel};

use super::differential::differential_for;
use super::explain::summarize;
use super::RiskFeatures;

/// Result of one assessment, ready to persist or return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub condition: String,
    pub score: f64,
    pub risk_level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub differential: Vec<DifferentialEntry>,
    pub summary: String,
}

/// Band a clamped score into a risk level.
fn band(score: f64) -> RiskLevel {
    if score < 0.35 {
        RiskLevel::Low
    } else if score < 0.65 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}

/// Assess one condition for one feature vector.
///
/// Unknown conditions use the generic profile: symptom load plus the
/// demographic indicators, on a neutral baseline.
pub fn assess(condition: &str, features: &RiskFeatures) -> RiskAssessment {
    let key = condition.trim().to_lowercase();
    let (baseline, factors) = match key.as_str() {
        "copd" => (
            0.12,
            collect(vec![
                symptom_load(features, 0.05, 0.20),
                air_quality(features),
                fine_particles(features),
                exposure_years(features, 10, 0.15),
                smoking(features, 0.20),
                age_over(features, 60, 0.10),
            ]),
        ),
        "asthma" => (
            0.10,
            collect(vec![
                symptom_load(features, 0.06, 0.24),
                air_quality(features),
                fine_particles(features),
                family_history(features, 0.15),
                age_under(features, 30, 0.05),
            ]),
        ),
        "lung_cancer" => (
            0.05,
            collect(vec![
                symptom_load(features, 0.04, 0.16),
                smoking(features, 0.25),
                exposure_years(features, 15, 0.20),
                family_history(features, 0.10),
                age_over(features, 55, 0.15),
            ]),
        ),
        "cardiovascular_disease" => (
            0.10,
            collect(vec![
                symptom_load(features, 0.05, 0.15),
                smoking(features, 0.15),
                fine_particles(features),
                family_history(features, 0.20),
                age_over(features, 50, 0.15),
            ]),
        ),
        _ => (
            0.08,
            collect(vec![
                symptom_load(features, 0.05, 0.20),
                smoking(features, 0.10),
                family_history(features, 0.10),
                age_over(features, 65, 0.10),
            ]),
        ),
    };

    let raw: f64 = baseline + factors.iter().map(|f| f.weight).sum::<f64>();
    let score = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { baseline };
    let risk_level = band(score);
    let summary = summarize(&key, score, risk_level, &factors);

    RiskAssessment {
        condition: key.clone(),
        score,
        risk_level,
        factors,
        differential: differential_for(&key),
        summary,
    }
}

fn collect(candidates: Vec<Option<RiskFactor>>) -> Vec<RiskFactor> {
    candidates.into_iter().flatten().collect()
}

// ─── Indicators ───────────────────────────────────────────────────────────────

/// Each reported symptom adds `per`, capped at `cap`.
fn symptom_load(f: &RiskFeatures, per: f64, cap: f64) -> Option<RiskFactor> {
    let count = f.symptoms.iter().filter(|s| !s.trim().is_empty()).count();
    if count == 0 {
        return None;
    }
    let weight = (per * count as f64).min(cap);
    Some(RiskFactor {
        label: "symptom_load".into(),
        weight,
        detail: format!("{count} reported symptom(s)"),
    })
}

/// AQI above 100 adds 0.15; above 150 adds a further 0.10.
fn air_quality(f: &RiskFeatures) -> Option<RiskFactor> {
    let aqi = f.aqi.filter(|v| v.is_finite())?;
    if aqi <= 100.0 {
        return None;
    }
    let weight = if aqi > 150.0 { 0.25 } else { 0.15 };
    Some(RiskFactor {
        label: "air_quality".into(),
        weight,
        detail: format!("AQI {aqi:.0} exceeds the healthy threshold"),
    })
}

/// PM2.5 above 35 µg/m³ adds 0.10.
fn fine_particles(f: &RiskFeatures) -> Option<RiskFactor> {
    let pm25 = f.pm25.filter(|v| v.is_finite())?;
    if pm25 <= 35.0 {
        return None;
    }
    Some(RiskFactor {
        label: "fine_particles".into(),
        weight: 0.10,
        detail: format!("PM2.5 at {pm25:.1} µg/m³"),
    })
}

fn exposure_years(f: &RiskFeatures, threshold: u32, weight: f64) -> Option<RiskFactor> {
    let years = f.years_exposure?;
    if years < threshold {
        return None;
    }
    Some(RiskFactor {
        label: "occupational_exposure".into(),
        weight,
        detail: format!("{years} years of occupational exposure"),
    })
}

fn smoking(f: &RiskFeatures, weight: f64) -> Option<RiskFactor> {
    if !f.smoker {
        return None;
    }
    Some(RiskFactor {
        label: "smoking".into(),
        weight,
        detail: "Current smoker".into(),
    })
}

fn family_history(f: &RiskFeatures, weight: f64) -> Option<RiskFactor> {
    if !f.family_history {
        return None;
    }
    Some(RiskFactor {
        label: "family_history".into(),
        weight,
        detail: "Family history of the condition".into(),
    })
}

fn age_over(f: &RiskFeatures, threshold: u32, weight: f64) -> Option<RiskFactor> {
    let age = f.age?;
    if age < threshold {
        return None;
    }
    Some(RiskFactor {
        label: "age".into(),
        weight,
        detail: format!("Age {age} (threshold {threshold})"),
    })
}

fn age_under(f: &RiskFeatures, threshold: u32, weight: f64) -> Option<RiskFactor> {
    let age = f.age?;
    if age >= threshold {
        return None;
    }
    Some(RiskFactor {
        label: "early_onset_age".into(),
        weight,
        detail: format!("Age {age} under {threshold}"),
    })
}
