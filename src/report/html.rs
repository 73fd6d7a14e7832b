use std::fmt::Write;

use super::summary::PatientReport;

/// Minimal HTML escaping for text interpolated into the report.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the self-contained HTML report. Deterministic for identical input.
pub fn render_html(report: &PatientReport) -> String {
    let p = &report.patient;
    let mut out = String::new();

    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n",
        escape(&report.title())
    );
    out.push_str(
        "<style>body{font-family:sans-serif;margin:2rem;max-width:48rem}\
         table{border-collapse:collapse;width:100%}\
         th,td{border:1px solid #ccc;padding:0.3rem 0.5rem;text-align:left}\
         .high{color:#b00020}.moderate{color:#b06000}.low{color:#207020}\
         footer{margin-top:2rem;color:#666;font-size:0.8rem}</style>\n</head>\n<body>\n",
    );

    let _ = writeln!(out, "<h1>{}</h1>", escape(&report.title()));
    let _ = writeln!(out, "<ul>");
    let _ = writeln!(out, "<li>Date of birth: {}</li>", p.date_of_birth);
    let _ = writeln!(out, "<li>Age: {}</li>", p.age_on(report.as_of));
    let _ = writeln!(out, "<li>Sex: {}</li>", p.sex.as_str());
    if let Some(blood_type) = &p.blood_type {
        let _ = writeln!(out, "<li>Blood type: {}</li>", escape(blood_type));
    }
    if let Some(city) = &p.city {
        let _ = writeln!(out, "<li>City: {}</li>", escape(city));
    }
    let _ = writeln!(
        out,
        "<li>Occupational exposure: {} year(s), smoker: {}</li>",
        p.years_exposure,
        if p.smoker { "yes" } else { "no" }
    );
    let _ = writeln!(out, "</ul>");

    let _ = writeln!(out, "<h2>Appointments ({})</h2>", report.appointments.len());
    if report.appointments.is_empty() {
        let _ = writeln!(out, "<p>None on record.</p>");
    } else {
        let _ = writeln!(
            out,
            "<table>\n<tr><th>Date</th><th>Doctor</th><th>Reason</th><th>Status</th><th>Notes</th></tr>"
        );
        for a in &report.appointments {
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                a.scheduled_at.format("%Y-%m-%d %H:%M"),
                escape(&a.doctor_name),
                escape(a.reason.as_deref().unwrap_or("visit")),
                a.status.as_str(),
                escape(a.notes.as_deref().unwrap_or("")),
            );
        }
        let _ = writeln!(out, "</table>");
    }

    let _ = writeln!(out, "<h2>Risk assessments ({})</h2>", report.predictions.len());
    if report.predictions.is_empty() {
        let _ = writeln!(out, "<p>None on record.</p>");
    } else {
        for pred in &report.predictions {
            let _ = writeln!(
                out,
                "<h3>{} — <span class=\"{}\">{:.0}%</span></h3>",
                escape(&pred.condition),
                pred.risk_level.as_str(),
                pred.score * 100.0,
            );
            let _ = writeln!(out, "<p>{}</p>", escape(&pred.summary));
            if !pred.factors.is_empty() {
                let _ = writeln!(out, "<ul>");
                for factor in &pred.factors {
                    let _ = writeln!(
                        out,
                        "<li>{} (+{:.0}%)</li>",
                        escape(&factor.detail),
                        factor.weight * 100.0
                    );
                }
                let _ = writeln!(out, "</ul>");
            }
        }
    }

    let _ = writeln!(
        out,
        "<footer>Generated from clinic records as of {}. Not clinical advice.</footer>",
        report.as_of
    );
    out.push_str("</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patient, Sex};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn minimal_report(first_name: &str) -> PatientReport {
        let now = Utc::now();
        PatientReport {
            patient: Patient {
                id: Uuid::nil(),
                first_name: first_name.into(),
                last_name: "Test".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                sex: Sex::Other,
                phone: None,
                email: None,
                address: None,
                city: None,
                blood_type: None,
                years_exposure: 0,
                smoker: false,
                created_at: now,
                updated_at: now,
            },
            as_of: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            appointments: vec![],
            predictions: vec![],
        }
    }

    #[test]
    fn html_is_well_formed_shell() {
        let html = render_html(&minimal_report("Jo"));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>\n"));
        assert!(html.contains("<h1>Patient summary — Test, Jo</h1>"));
        assert!(html.contains("None on record."));
    }

    #[test]
    fn interpolated_text_is_escaped() {
        let html = render_html(&minimal_report("<script>alert(1)</script>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn render_is_deterministic() {
        let report = minimal_report("Jo");
        assert_eq!(render_html(&report), render_html(&report));
    }
}
