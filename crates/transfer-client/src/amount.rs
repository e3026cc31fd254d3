//! Amount validation and the display-only quote.

use common::{CONVERSION_RATE, MAX_AMOUNT, MIN_AMOUNT, SOURCE_SYMBOL};

/// Which bound an entered amount violates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundViolation {
    BelowMin,
    AboveMax,
}

impl BoundViolation {
    pub fn notice(self) -> String {
        match self {
            BoundViolation::BelowMin => format!("Minimum amount is {MIN_AMOUNT} {SOURCE_SYMBOL}"),
            BoundViolation::AboveMax => format!("Maximum amount is {MAX_AMOUNT} {SOURCE_SYMBOL}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmountCheck {
    pub amount: f64,
    pub is_valid: bool,
    /// quoted amount as shown in the read-only field
    pub quote: String,
    /// set when a positive amount falls outside the bounds
    pub violation: Option<BoundViolation>,
}

/// Lenient float parse of the amount field: a leading numeric prefix is
/// accepted, anything unparsable or empty reads as zero.
pub fn parse_amount(input: &str) -> f64 {
    let trimmed = input.trim();
    let end = numeric_prefix_len(trimmed);
    trimmed[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        i += 1;
    }
    if !seen_digit {
        return 0;
    }
    // optional exponent, only taken when followed by digits
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > digits_start {
            i = j;
        }
    }
    i
}

pub fn is_valid_amount(amount: f64) -> bool {
    (MIN_AMOUNT..=MAX_AMOUNT).contains(&amount)
}

/// `amount × rate` to two decimals, `"0"` for non-positive amounts
pub fn quote(amount: f64) -> String {
    if amount > 0.0 {
        format!("{:.2}", amount * CONVERSION_RATE)
    } else {
        "0".to_string()
    }
}

/// Expected quoted amount for a submitted transfer, shortest form
pub fn expected_quote(amount: f64) -> f64 {
    amount * CONVERSION_RATE
}

pub fn check_amount(input: &str) -> AmountCheck {
    let amount = parse_amount(input);
    let is_valid = is_valid_amount(amount);
    let violation = if amount > 0.0 && !is_valid {
        if amount < MIN_AMOUNT {
            Some(BoundViolation::BelowMin)
        } else {
            Some(BoundViolation::AboveMax)
        }
    } else {
        None
    };

    AmountCheck {
        amount,
        is_valid,
        quote: quote(amount),
        violation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("0.5"), 0.5);
        assert_eq!(parse_amount("  .25 "), 0.25);
        assert_eq!(parse_amount("1e-4"), 0.0001);
        assert_eq!(parse_amount("0.3eth"), 0.3);
        assert_eq!(parse_amount("2e"), 2.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("."), 0.0);
        assert_eq!(parse_amount("-0.5"), -0.5);
    }

    #[test]
    fn test_bounds_inclusive() {
        assert!(is_valid_amount(0.0001));
        assert!(is_valid_amount(1.0));
        assert!(is_valid_amount(0.5));
        assert!(!is_valid_amount(0.00009));
        assert!(!is_valid_amount(1.0001));
        assert!(!is_valid_amount(0.0));
    }

    #[test]
    fn test_below_min_still_quotes() {
        let check = check_amount("0.00005");
        assert!(!check.is_valid);
        assert_eq!(check.quote, "1.00");
        assert_eq!(check.violation, Some(BoundViolation::BelowMin));
        assert_eq!(check.violation.unwrap().notice(), "Minimum amount is 0.0001 ETH");
    }

    #[test]
    fn test_above_max() {
        let check = check_amount("2");
        assert_eq!(check.quote, "40000.00");
        assert_eq!(check.violation.unwrap().notice(), "Maximum amount is 1 ETH");
    }

    #[test]
    fn test_valid_amount_quote() {
        let check = check_amount("0.5");
        assert!(check.is_valid);
        assert_eq!(check.quote, "10000.00");
        assert!(check.violation.is_none());
    }

    #[test]
    fn test_zero_and_negative_quote_zero() {
        assert_eq!(check_amount("").quote, "0");
        assert_eq!(check_amount("-3").quote, "0");
        assert!(check_amount("-3").violation.is_none());
    }

    #[test]
    fn test_expected_quote() {
        assert_eq!(expected_quote(0.1).to_string(), "2000");
    }
}
