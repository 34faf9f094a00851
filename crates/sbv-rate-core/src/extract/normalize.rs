//! Turns a matched numeric token into a decimal value and a [`QuoteScale`].
//!
//! Locale rules:
//! - both `.` and `,` present: the later one is the decimal mark and the
//!   other groups thousands;
//! - a single separator followed by exactly three digits and preceded by at
//!   most three digits groups thousands;
//! - repeated separators with three-digit groups group thousands;
//! - otherwise a single separator is the decimal mark.
//!
//! A dot-grouped five-digit token (`23.977`) is the SBV thousands display and
//! keeps its decimal point with [`QuoteScale::Thousands`].

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::QuoteScale;

/// Digits before the decimal point in the SBV thousands display.
const THOUSANDS_DISPLAY_INT_DIGITS: usize = 2;

/// Decimal value read from a token, with the unit it was printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedNumber {
    pub value: Decimal,
    pub scale: QuoteScale,
}

impl NormalizedNumber {
    const fn unit(value: Decimal) -> Self {
        Self {
            value,
            scale: QuoteScale::Unit,
        }
    }
}

/// Normalizes a token made of ASCII digits, `.` and `,`. `None` when the
/// separators follow no known locale layout.
pub fn normalize_token(token: &str) -> Option<NormalizedNumber> {
    let token = token.trim();
    if token.is_empty() || !token.chars().all(|ch| ch.is_ascii_digit() || ch == '.' || ch == ',') {
        return None;
    }

    let dots = token.matches('.').count();
    let commas = token.matches(',').count();

    match (dots, commas) {
        (0, 0) => parse_decimal(token).map(NormalizedNumber::unit),
        (_, 0) => normalize_single_separator(token, '.', dots),
        (0, _) => normalize_single_separator(token, ',', commas),
        _ => normalize_mixed(token),
    }
}

/// Inserts a decimal point `int_digits` digits from the left of a digit run.
pub fn reinsert_decimal_point(digits: &str, int_digits: usize) -> Option<Decimal> {
    if int_digits == 0
        || digits.len() <= int_digits
        || !digits.chars().all(|ch| ch.is_ascii_digit())
    {
        return None;
    }
    let (int_part, frac_part) = digits.split_at(int_digits);
    parse_decimal(&format!("{int_part}.{frac_part}"))
}

fn normalize_single_separator(token: &str, separator: char, count: usize) -> Option<NormalizedNumber> {
    if count > 1 {
        return ungroup(token, separator)
            .and_then(|digits| parse_decimal(&digits))
            .map(NormalizedNumber::unit);
    }

    let (int_part, frac_part) = token.split_once(separator)?;
    if int_part.is_empty() || frac_part.is_empty() {
        return None;
    }

    let grouping = frac_part.len() == 3 && int_part.len() <= 3;
    if !grouping {
        return parse_decimal(&format!("{int_part}.{frac_part}")).map(NormalizedNumber::unit);
    }

    if separator == '.' && int_part.len() == THOUSANDS_DISPLAY_INT_DIGITS {
        let digits = format!("{int_part}{frac_part}");
        return reinsert_decimal_point(&digits, THOUSANDS_DISPLAY_INT_DIGITS).map(|value| {
            NormalizedNumber {
                value,
                scale: QuoteScale::Thousands,
            }
        });
    }

    parse_decimal(&format!("{int_part}{frac_part}")).map(NormalizedNumber::unit)
}

fn normalize_mixed(token: &str) -> Option<NormalizedNumber> {
    let last_dot = token.rfind('.')?;
    let last_comma = token.rfind(',')?;
    let (decimal_mark, grouping) = if last_dot > last_comma {
        ('.', ',')
    } else {
        (',', '.')
    };

    let (int_part, frac_part) = token.rsplit_once(decimal_mark)?;
    if frac_part.is_empty() || int_part.contains(decimal_mark) {
        return None;
    }
    let int_digits = ungroup(int_part, grouping)?;
    parse_decimal(&format!("{int_digits}.{frac_part}")).map(NormalizedNumber::unit)
}

/// Removes grouping separators, requiring a 1–3 digit lead group and
/// three-digit groups after it.
fn ungroup(token: &str, separator: char) -> Option<String> {
    let mut groups = token.split(separator);
    let lead = groups.next()?;
    if lead.is_empty() || lead.len() > 3 || !lead.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }

    let mut digits = String::from(lead);
    for group in groups {
        if group.len() != 3 || !group.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value).ok()
}
