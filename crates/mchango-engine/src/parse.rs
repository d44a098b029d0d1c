// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-text input parsing for flow steps.

/// Normalizes inbound text for matching: trimmed and lowercased.
///
/// The original casing is preserved separately wherever it is stored or
/// echoed (display names, group names).
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Extracts the first run of digits (optionally comma-grouped) from the text.
///
/// `"toa 50,000 leo"` parses as `Some(50000)`. Returns `None` when the text
/// contains no digits or the run overflows u64.
pub fn extract_amount(text: &str) -> Option<u64> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;

    let mut digits = String::new();
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_digit() {
            digits.push(b as char);
            i += 1;
        } else if b == b',' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
            // Comma grouping: skip only when followed by another digit.
            i += 1;
        } else {
            break;
        }
    }

    digits.parse().ok()
}

/// Parses an amount and checks it against an inclusive range.
///
/// Out-of-range values are invalid, never clamped.
pub fn parse_amount_in_range(text: &str, min: u64, max: u64) -> Option<u64> {
    extract_amount(text).filter(|amount| (min..=max).contains(amount))
}

/// Parses a member count and checks it against an inclusive range.
pub fn parse_member_count(text: &str, min: u32, max: u32) -> Option<u32> {
    let n = extract_amount(text)?;
    let n = u32::try_from(n).ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Validates a group join code: non-empty and alphanumeric after trimming.
/// Returns the code uppercased for lookup.
pub fn parse_group_code(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  TOA 500  "), "toa 500");
    }

    #[test]
    fn extract_amount_finds_first_digit_run() {
        assert_eq!(extract_amount("toa 50000"), Some(50_000));
        assert_eq!(extract_amount("nataka kutoa 25000 kesho"), Some(25_000));
        assert_eq!(extract_amount("hakuna namba"), None);
    }

    #[test]
    fn extract_amount_handles_comma_grouping() {
        assert_eq!(extract_amount("toa 50,000"), Some(50_000));
        assert_eq!(extract_amount("1,000,000"), Some(1_000_000));
        // Trailing comma is not grouping.
        assert_eq!(extract_amount("500, pesa"), Some(500));
    }

    #[test]
    fn extract_amount_stops_at_first_run() {
        assert_eq!(extract_amount("toa 500 au 900"), Some(500));
    }

    #[test]
    fn amount_in_range_rejects_without_clamping() {
        assert_eq!(parse_amount_in_range("toa 50000", 10_000, 1_000_000), Some(50_000));
        assert_eq!(parse_amount_in_range("toa 500", 10_000, 1_000_000), None);
        assert_eq!(parse_amount_in_range("toa 2000000", 10_000, 1_000_000), None);
        // Boundary values are accepted.
        assert_eq!(parse_amount_in_range("10000", 10_000, 1_000_000), Some(10_000));
        assert_eq!(
            parse_amount_in_range("1,000,000", 10_000, 1_000_000),
            Some(1_000_000)
        );
    }

    #[test]
    fn member_count_bounds() {
        assert_eq!(parse_member_count("10", 2, 50), Some(10));
        assert_eq!(parse_member_count("1", 2, 50), None);
        assert_eq!(parse_member_count("51", 2, 50), None);
        assert_eq!(parse_member_count("watu 25", 2, 50), Some(25));
    }

    #[test]
    fn group_code_validation() {
        assert_eq!(parse_group_code(" chama001 "), Some("CHAMA001".to_string()));
        assert_eq!(parse_group_code(""), None);
        assert_eq!(parse_group_code("bad code!"), None);
    }
}
