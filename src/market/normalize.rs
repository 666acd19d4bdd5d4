//! Conversion of loosely-typed upstream records into [`PriceRecord`]s
//!
//! Normalization never rejects a record: missing strings become empty, and
//! prices that are missing, not numeric, negative or non-finite become 0.
//! A price with trailing text ("1500 Rs") keeps its leading number.
//! The number of records out always equals the number of records in.

use super::{PriceRecord, RawPriceRecord};

/// Normalizes a single upstream record
pub fn normalize_record(raw: &RawPriceRecord) -> PriceRecord {
    PriceRecord {
        state: text(&raw.state),
        district: text(&raw.district),
        market: text(&raw.market),
        commodity: text(&raw.commodity),
        variety: text(&raw.variety),
        grade: text(&raw.grade),
        arrival_date: text(&raw.arrival_date),
        min_price: price(&raw.min_price),
        max_price: price(&raw.max_price),
        modal_price: price(&raw.modal_price),
    }
}

/// Normalizes every record, preserving order and count
pub fn normalize_records(raw: &[RawPriceRecord]) -> Vec<PriceRecord> {
    raw.iter().map(normalize_record).collect()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn price(value: &Option<String>) -> f64 {
    value
        .as_deref()
        .and_then(|s| leading_number(s.trim()))
        .filter(|p| p.is_finite() && *p >= 0.0)
        .unwrap_or(0.0)
}

/// Parses the longest prefix of `s` that reads as a decimal number
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// exponent only when digits follow the `e`. Returns `None` when no digit
/// starts the string.
fn leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}
