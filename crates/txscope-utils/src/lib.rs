//! Formatting helpers shared by the query layer and the command line

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an integer string with thousands separators
pub fn format_number<T: ToString>(n: T, separator: &str) -> String {
    let s = n.to_string();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };

    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push_str(&separator.chars().rev().collect::<String>());
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    format!("{}{}", sign, result.chars().rev().collect::<String>())
}

/// Format a decimal amount as currency, e.g. `$1,234.50`
pub fn format_currency(amount: Decimal, symbol: &str, decimal_places: u32, separator: &str) -> String {
    let rounded = amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.*}", decimal_places as usize, rounded.abs());

    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(symbol);
    out.push_str(&format_number(whole, separator));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Format a percentage with one decimal place, e.g. `66.7%`
pub fn format_percent(value: Decimal) -> String {
    format!("{:.1}%", value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

/// Upper-case only the first character of a label
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0, ","), "0");
        assert_eq!(format_number(999, ","), "999");
        assert_eq!(format_number(1000, ","), "1,000");
        assert_eq!(format_number(1234567, ","), "1,234,567");
        assert_eq!(format_number(-1234567, " "), "-1 234 567");
    }

    #[test]
    fn test_format_currency() {
        let amount = Decimal::from_str("1234.5").unwrap();
        assert_eq!(format_currency(amount, "$", 2, ","), "$1,234.50");

        let amount = Decimal::from_str("30").unwrap();
        assert_eq!(format_currency(amount, "$", 2, ","), "$30.00");

        let amount = Decimal::from_str("0.005").unwrap();
        assert_eq!(format_currency(amount, "$", 2, ","), "$0.01");

        let amount = Decimal::from_str("-1000").unwrap();
        assert_eq!(format_currency(amount, "€", 0, "."), "-€1.000");
    }

    #[test]
    fn test_format_percent() {
        let rate = Decimal::from_str("66.666").unwrap();
        assert_eq!(format_percent(rate), "66.7%");
        assert_eq!(format_percent(Decimal::ZERO), "0.0%");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("payment"), "Payment");
        assert_eq!(capitalize_first("N/A"), "N/A");
        assert_eq!(capitalize_first(""), "");
    }
}
