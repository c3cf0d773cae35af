/// Formats a decimal price string the way the store presents COP amounts: rounded to the nearest whole unit,
/// with a `.` separating every group of three digits.
///
/// `"50000.00"` becomes `"50.000"` and `"1234567"` becomes `"1.234.567"`. A string that does not parse as a
/// number is returned unchanged, so a garbled upstream total still produces a sendable message.
pub fn format_price(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(amount) = trimmed.parse::<f64>() else {
        return raw.to_string();
    };
    let units = amount.round() as i64;
    let digits = units.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if units < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
