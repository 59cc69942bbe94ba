use chrono::NaiveDate;

/// Returned by the currency formatters when the input is not a number
pub const INVALID_VALUE: &str = "Valor inválido";

/// Formats a number with period thousands separators
///
/// # Examples
/// ```
/// use backend::shared::format::format_number;
/// assert_eq!(format_number(1234567), "1.234.567");
/// assert_eq!(format_number(42), "42");
/// assert_eq!(format_number(0), "0");
/// ```
pub fn format_number(n: usize) -> String {
    group_thousands(&n.to_string())
}

/// Formats a value as Brazilian reais: `R$ 1.234,50`
///
/// `None` (unknown value) gives an empty string; NaN and infinities give
/// [`INVALID_VALUE`].
///
/// # Examples
/// ```
/// use backend::shared::format::format_currency_brl;
/// assert_eq!(format_currency_brl(Some(1234.5)), "R$ 1.234,50");
/// assert_eq!(format_currency_brl(None), "");
/// ```
pub fn format_currency_brl(value: Option<f64>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    if !value.is_finite() {
        return INVALID_VALUE.to_string();
    }

    let formatted = format!("{:.2}", value);
    let (sign, digits) = match formatted.strip_prefix('-') {
        // -0.0 and negatives that round to zero print unsigned
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => ("", rest),
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (integer_part, decimal_part) = digits.split_once('.').unwrap_or((digits, "00"));

    format!("R$ {}{},{}", sign, group_thousands(integer_part), decimal_part)
}

/// Same as [`format_currency_brl`] for raw text input.
///
/// A comma decimal separator is accepted; blank text is an unknown value.
pub fn format_currency_brl_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(value) => format_currency_brl(Some(value)),
        Err(_) => INVALID_VALUE.to_string(),
    }
}

/// DD/MM/YYYY, empty when the date is unknown
pub fn format_date_br(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

fn group_thousands(digits: &str) -> String {
    let mut result = String::new();
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}
