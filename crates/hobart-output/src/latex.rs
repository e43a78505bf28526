//! LaTeX rendering helpers.

/// Escape LaTeX special characters.
pub fn escape_for_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\textbackslash "),
            '&' => escaped.push_str("\\&"),
            '%' => escaped.push_str("\\%"),
            '#' => escaped.push_str("\\#"),
            '_' => escaped.push_str("\\_"),
            '{' => escaped.push_str("\\{"),
            '}' => escaped.push_str("\\}"),
            '~' => escaped.push_str("\\textasciitilde "),
            '^' => escaped.push_str("\\textasciicircum "),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Format a number with `precision` decimals and comma thousands separators.
///
/// Non-finite values render as an empty cell.
pub fn format_number(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return String::new();
    }

    let formatted = format!("{:.*}", precision, value.abs());
    let (integer, fraction) = match formatted.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + integer.len() / 3 + 1);
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        grouped.push('-');
    }
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

/// Format a count with comma thousands separators.
pub fn format_count(value: usize) -> String {
    format_number(value as f64, 0)
}
