use crate::models::DifferentialEntry;

/// Static differential-diagnosis table: primary condition → alternatives
/// with preset probabilities. Returned unmodified; unknown conditions
/// yield an empty table.
const DIFFERENTIAL_TABLE: &[(&str, &[(&str, f64)])] = &[
    (
        "copd",
        &[
            ("asthma", 0.30),
            ("bronchiectasis", 0.20),
            ("congestive_heart_failure", 0.15),
            ("lung_cancer", 0.10),
        ],
    ),
    (
        "asthma",
        &[
            ("copd", 0.25),
            ("vocal_cord_dysfunction", 0.15),
            ("gerd", 0.15),
            ("allergic_rhinitis", 0.10),
        ],
    ),
    (
        "lung_cancer",
        &[
            ("tuberculosis", 0.25),
            ("pneumonia", 0.20),
            ("copd", 0.15),
            ("sarcoidosis", 0.05),
        ],
    ),
    (
        "cardiovascular_disease",
        &[
            ("anxiety_disorder", 0.20),
            ("gerd", 0.15),
            ("musculoskeletal_pain", 0.15),
            ("pulmonary_embolism", 0.10),
        ],
    ),
];

/// Look up the differential table for a (lowercased) condition key.
pub fn differential_for(condition: &str) -> Vec<DifferentialEntry> {
    DIFFERENTIAL_TABLE
        .iter()
        .find(|(key, _)| *key == condition)
        .map(|(_, alternatives)| {
            alternatives
                .iter()
                .map(|(name, probability)| DifferentialEntry {
                    condition: (*name).to_string(),
                    probability: *probability,
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_condition_returns_table_in_order() {
        let table = differential_for("copd");
        assert_eq!(table.len(), 4);
        assert_eq!(table[0].condition, "asthma");
        assert_eq!(table[0].probability, 0.30);
    }

    #[test]
    fn unknown_condition_returns_empty() {
        assert!(differential_for("common_cold").is_empty());
    }

    #[test]
    fn probabilities_are_valid_and_descending() {
        for (key, _) in DIFFERENTIAL_TABLE {
            let table = differential_for(key);
            assert!(table.windows(2).all(|w| w[0].probability >= w[1].probability));
            assert!(table.iter().all(|e| (0.0..=1.0).contains(&e.probability)));
        }
    }
}
