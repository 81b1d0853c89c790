/// Format a point total for display.
///
/// Rounds to three decimals first, then drops the fraction if it rounded to
/// zero: `1234.5` -> `"1,234.500 points"`, `999.9996` -> `"1,000 points"`.
pub fn format_points(value: f64) -> String {
    if !value.is_finite() {
        return format!("{} points", value);
    }

    // Decimal formatting rounds exactly and has no integer range limit
    let rounded = format!("{:.3}", value.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), "000"));
    let is_zero = whole.bytes().all(|b| b == b'0') && fraction == "000";
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if fraction == "000" {
        format!("{}{} points", sign, group_thousands(whole))
    } else {
        format!("{}{}.{} points", sign, group_thousands(whole), fraction)
    }
}

/// Insert `,` between every group of three digits
pub fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Truncate a response body to avoid logging excessive data
pub fn truncate_body(body: &str, max_len: usize) -> String {
    if body.len() <= max_len {
        return body.to_string();
    }
    let mut end = max_len;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}
