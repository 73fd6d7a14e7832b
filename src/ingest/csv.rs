/// One parsed record with the 1-based line number it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Parse RFC-4180-style CSV: comma-separated, `"` quoting, doubled
/// quotes inside quoted fields, LF or CRLF record separators, and
/// newlines allowed inside quoted fields.
///
/// The parser itself never fails — structural problems (an unterminated
/// quote swallowing the rest of the input, a wrong field count) surface
/// as records that fail validation downstream.
pub fn parse_csv(input: &str) -> Vec<CsvRecord> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut record_start_line = 1usize;
    let mut record_has_content = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if !in_quotes && field.is_empty() => {
                in_quotes = true;
                record_has_content = true;
            }
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
                record_has_content = true;
            }
            '\r' if !in_quotes => {
                // Swallow the CR of a CRLF pair; a lone CR is treated as data
                if chars.peek() == Some(&'\n') {
                    continue;
                }
                field.push('\r');
            }
            '\n' if !in_quotes => {
                line += 1;
                if record_has_content || !field.is_empty() || !fields.is_empty() {
                    fields.push(std::mem::take(&mut field));
                    records.push(CsvRecord {
                        line: record_start_line,
                        fields: std::mem::take(&mut fields),
                    });
                }
                record_start_line = line;
                record_has_content = false;
            }
            '\n' => {
                line += 1;
                field.push('\n');
            }
            _ => {
                field.push(c);
                record_has_content = true;
            }
        }
    }

    // Trailing record without a final newline
    if record_has_content || !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(CsvRecord {
            line: record_start_line,
            fields,
        });
    }

    records
}
