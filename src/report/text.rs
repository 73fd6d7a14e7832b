use std::fmt::Write;

use super::summary::PatientReport;

/// Render the plain-text report. Pure function of the report —
/// identical inputs produce the identical string.
pub fn render_text(report: &PatientReport) -> String {
    let mut out = String::new();
    let p = &report.patient;

    let _ = writeln!(out, "{}", report.title().to_uppercase());
    let _ = writeln!(out, "{}", "=".repeat(report.title().len()));
    let _ = writeln!(out);
    let _ = writeln!(out, "Date of birth:  {}", p.date_of_birth);
    let _ = writeln!(out, "Age:            {}", p.age_on(report.as_of));
    let _ = writeln!(out, "Sex:            {}", p.sex.as_str());
    if let Some(blood_type) = &p.blood_type {
        let _ = writeln!(out, "Blood type:     {blood_type}");
    }
    if let Some(city) = &p.city {
        let _ = writeln!(out, "City:           {city}");
    }
    let _ = writeln!(
        out,
        "Exposure:       {} year(s), smoker: {}",
        p.years_exposure,
        if p.smoker { "yes" } else { "no" }
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "APPOINTMENTS ({})", report.appointments.len());
    let _ = writeln!(out, "------------");
    if report.appointments.is_empty() {
        let _ = writeln!(out, "  none on record");
    }
    for a in &report.appointments {
        let _ = writeln!(
            out,
            "  {} — {} with {} [{}]{}",
            a.scheduled_at.format("%Y-%m-%d %H:%M"),
            a.reason.as_deref().unwrap_or("visit"),
            a.doctor_name,
            a.status.as_str(),
            a.notes
                .as_deref()
                .map(|n| format!(" — {n}"))
                .unwrap_or_default(),
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "RISK ASSESSMENTS ({})", report.predictions.len());
    let _ = writeln!(out, "----------------");
    if report.predictions.is_empty() {
        let _ = writeln!(out, "  none on record");
    }
    for pred in &report.predictions {
        let _ = writeln!(
            out,
            "  {}: {:.0}% [{}] ({})",
            pred.condition,
            pred.score * 100.0,
            pred.risk_level.as_str(),
            pred.created_at.format("%Y-%m-%d"),
        );
        for factor in &pred.factors {
            let _ = writeln!(out, "    · {} (+{:.0}%)", factor.detail, factor.weight * 100.0);
        }
        if !pred.differential.is_empty() {
            let alternatives: Vec<String> = pred
                .differential
                .iter()
                .map(|d| format!("{} {:.0}%", d.condition, d.probability * 100.0))
                .collect();
            let _ = writeln!(out, "    also consider: {}", alternatives.join(", "));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated from clinic records as of {}. Not clinical advice.",
        report.as_of
    );

    out
}
