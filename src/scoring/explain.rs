use crate::models::{RiskFactor, RiskLevel};

/// Render a one-paragraph explanation from the triggered factors.
/// Deterministic: same inputs always produce the same text.
pub fn summarize(
    condition: &str,
    score: f64,
    level: RiskLevel,
    factors: &[RiskFactor],
) -> String {
    let condition_name = condition.replace('_', " ");
    let mut out = format!(
        "Estimated {condition_name} risk is {} ({:.0}%).",
        level.as_str(),
        score * 100.0
    );

    if factors.is_empty() {
        out.push_str(" No contributing indicators were reported; the estimate reflects the population baseline.");
        return out;
    }

    out.push_str(" Contributing indicators: ");
    let parts: Vec<String> = factors
        .iter()
        .map(|f| format!("{} (+{:.0}%)", f.detail.trim_end_matches('.'), f.weight * 100.0))
        .collect();
    out.push_str(&parts.join("; "));
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor(label: &str, weight: f64, detail: &str) -> RiskFactor {
        RiskFactor {
            label: label.into(),
            weight,
            detail: detail.into(),
        }
    }

    #[test]
    fn baseline_summary_mentions_no_indicators() {
        let text = summarize("copd", 0.12, RiskLevel::Low, &[]);
        assert!(text.contains("copd risk is low"));
        assert!(text.contains("population baseline"));
    }

    #[test]
    fn factors_are_listed_with_percentages() {
        let text = summarize(
            "lung_cancer",
            0.7,
            RiskLevel::High,
            &[
                factor("smoking", 0.25, "Current smoker"),
                factor("age", 0.15, "Age 70 (threshold 55)"),
            ],
        );
        assert!(text.contains("lung cancer risk is high (70%)"));
        assert!(text.contains("Current smoker (+25%)"));
        assert!(text.contains("Age 70 (threshold 55) (+15%)"));
    }

    #[test]
    fn summary_is_deterministic() {
        let factors = vec![factor("smoking", 0.2, "Current smoker")];
        let a = summarize("copd", 0.4, RiskLevel::Moderate, &factors);
        let b = summarize("copd", 0.4, RiskLevel::Moderate, &factors);
        assert_eq!(a, b);
    }
}
