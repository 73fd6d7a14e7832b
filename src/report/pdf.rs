use std::io::BufWriter;

use printpdf::*;

use super::summary::PatientReport;
use super::ReportError;

/// Generates the PDF report. Returns PDF bytes.
pub fn render_pdf(report: &PatientReport) -> Result<Vec<u8>, ReportError> {
    let title = report.title();
    let (doc, page1, layer1) = PdfDocument::new(&title, Mm(210.0), Mm(297.0), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
    let courier = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;

    let p = &report.patient;
    let mut y = Mm(280.0);

    // Header
    layer.use_text(&title, 14.0, Mm(20.0), y, &bold);
    y -= Mm(8.0);
    layer.use_text(
        format!(
            "DOB {}  ·  age {}  ·  {}",
            p.date_of_birth,
            p.age_on(report.as_of),
            p.sex.as_str()
        ),
        9.0,
        Mm(20.0),
        y,
        &font,
    );
    y -= Mm(4.5);
    layer.use_text(
        format!(
            "Exposure {} year(s), smoker: {}",
            p.years_exposure,
            if p.smoker { "yes" } else { "no" }
        ),
        9.0,
        Mm(20.0),
        y,
        &font,
    );
    y -= Mm(10.0);

    // Appointments
    layer.use_text("APPOINTMENTS:", 11.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    if report.appointments.is_empty() {
        layer.use_text("  none on record", 8.0, Mm(25.0), y, &courier);
        y -= Mm(4.0);
    }
    for a in &report.appointments {
        let text = format!(
            "  {} — {} — {} [{}]",
            a.scheduled_at.format("%Y-%m-%d %H:%M"),
            a.reason.as_deref().unwrap_or("visit"),
            a.doctor_name,
            a.status.as_str()
        );
        for line in wrap_text(&text, 90) {
            layer.use_text(&line, 8.0, Mm(25.0), y, &courier);
            y -= Mm(4.0);
        }
    }
    y -= Mm(6.0);

    // Risk assessments
    layer.use_text("RISK ASSESSMENTS:", 11.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    if report.predictions.is_empty() {
        layer.use_text("  none on record", 8.0, Mm(25.0), y, &courier);
        y -= Mm(4.0);
    }
    for pred in &report.predictions {
        let head = format!(
            "  {}: {:.0}% [{}] ({})",
            pred.condition,
            pred.score * 100.0,
            pred.risk_level.as_str(),
            pred.created_at.format("%Y-%m-%d")
        );
        layer.use_text(&head, 9.0, Mm(25.0), y, &bold);
        y -= Mm(4.5);
        for line in wrap_text(&pred.summary, 90) {
            layer.use_text(&line, 8.0, Mm(27.0), y, &font);
            y -= Mm(4.0);
        }
        y -= Mm(2.0);
    }

    // Footer
    y -= Mm(6.0);
    layer.use_text(
        format!(
            "Generated from clinic records as of {}. Not clinical advice.",
            report.as_of
        ),
        8.0,
        Mm(20.0),
        y,
        &font,
    );

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Pdf(format!("buffer error: {e}")))
}

/// Greedy word wrap at `width` characters.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
