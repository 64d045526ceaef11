//! Timezone label normalization
//!
//! Turns free-text labels such as `est`, `GMT+2` or `+05:30` into canonical
//! `UTC±H[:MM]` offsets.

use regex::Regex;
use std::sync::LazyLock;

/// Well-known zone abbreviations and their canonical offsets
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("UTC", "UTC+0"),
    ("GMT", "UTC+0"),
    ("EST", "UTC-5"),
    ("CST", "UTC-6"),
    ("MST", "UTC-7"),
    ("PST", "UTC-8"),
    ("BST", "UTC+1"),
    ("CET", "UTC+1"),
    ("EET", "UTC+2"),
    ("IST", "UTC+5:30"),
    ("JST", "UTC+9"),
    ("AEST", "UTC+10"),
    ("NZST", "UTC+12"),
];

/// Signed offset anywhere in a label, e.g. `+9`, `-0530`, `+05:30`
static OFFSET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([+-])(\d{1,2}):?(\d{0,2})").expect("valid offset pattern"));

/// Canonical form produced by [`normalize_timezone`]
static CANONICAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^UTC([+-])(\d{1,2})(?::(\d{2}))?$").expect("valid canonical pattern")
});

/// Normalize a raw timezone label into its canonical `UTC±H[:MM]` form.
///
/// Labels that cannot be interpreted come back trimmed and uppercased, so
/// they still form a bucket of their own.
pub fn normalize_timezone(raw: &str) -> String {
    let label = raw.trim().to_uppercase();

    // Table first so a bare `UTC` maps to `UTC+0` instead of passing through
    if let Some((_, offset)) = ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == label) {
        return (*offset).to_string();
    }

    if label.starts_with("UTC") {
        return label;
    }

    if let Some(caps) = OFFSET_PATTERN.captures(&label) {
        let hours: u32 = caps[2].parse().unwrap_or(0);
        let minutes: u32 = caps
            .get(3)
            .map(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .and_then(|m| m.parse().ok())
            .unwrap_or(0);
        // `-00` is the same offset as `+00`
        let sign = if hours == 0 && minutes == 0 { "+" } else { &caps[1] };

        return if minutes == 0 {
            format!("UTC{}{}", sign, hours)
        } else {
            format!("UTC{}{}:{:02}", sign, hours, minutes)
        };
    }

    label
}

/// Parse a canonical offset into signed hours (`UTC+5:30` -> `5.5`).
///
/// Returns `None` for labels that are not of the `UTC±H[:MM]` form.
pub fn parse_offset_hours(offset: &str) -> Option<f64> {
    let caps = CANONICAL_PATTERN.captures(offset)?;
    let hours: f64 = caps[2].parse().ok()?;
    let minutes: f64 = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0.0,
    };
    if minutes >= 60.0 {
        return None;
    }

    let magnitude = hours + minutes / 60.0;
    Some(if &caps[1] == "-" { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_labels_are_unchanged() {
        for label in ["UTC+0", "UTC-5", "UTC+5:30", "UTC+12", "UTC-9:30", "UTC+14"] {
            assert_eq!(normalize_timezone(label), label);
        }
    }

    #[test]
    fn test_abbreviations() {
        assert_eq!(normalize_timezone("EST"), "UTC-5");
        assert_eq!(normalize_timezone("jst"), "UTC+9");
        assert_eq!(normalize_timezone("ist"), "UTC+5:30");
        assert_eq!(normalize_timezone("  nzst "), "UTC+12");
        assert_eq!(normalize_timezone("utc"), "UTC+0");
    }

    #[test]
    fn test_numeric_offsets() {
        assert_eq!(normalize_timezone("GMT+2"), "UTC+2");
        assert_eq!(normalize_timezone("+05:30"), "UTC+5:30");
        assert_eq!(normalize_timezone("-0800"), "UTC-8");
        assert_eq!(normalize_timezone("gmt-3:00"), "UTC-3");
        assert_eq!(normalize_timezone("+9"), "UTC+9");
    }

    #[test]
    fn test_unrecognised_labels_are_uppercased() {
        assert_eq!(normalize_timezone("Mars/OlympusMons"), "MARS/OLYMPUSMONS");
        assert_eq!(normalize_timezone(" europe/berlin "), "EUROPE/BERLIN");
    }

    #[test]
    fn test_equivalent_labels_share_a_bucket() {
        assert_eq!(normalize_timezone("gmt"), normalize_timezone("+00"));
        assert_eq!(normalize_timezone("PST"), normalize_timezone("GMT-8"));
        assert_eq!(normalize_timezone("-00"), normalize_timezone("GMT"));
        assert_eq!(normalize_timezone("-0"), "UTC+0");
        assert_eq!(normalize_timezone("GMT-0:00"), "UTC+0");
        assert_eq!(normalize_timezone("-0:30"), "UTC-0:30");
    }

    #[test]
    fn test_parse_offset_hours() {
        assert_eq!(parse_offset_hours("UTC+0"), Some(0.0));
        assert_eq!(parse_offset_hours("UTC-8"), Some(-8.0));
        assert_eq!(parse_offset_hours("UTC+5:30"), Some(5.5));
        assert_eq!(parse_offset_hours("UTC-3:30"), Some(-3.5));
        assert_eq!(parse_offset_hours("UTC+5:45"), Some(5.75));
    }

    #[test]
    fn test_parse_offset_rejects_non_canonical() {
        assert_eq!(parse_offset_hours("MARS/OLYMPUSMONS"), None);
        assert_eq!(parse_offset_hours("UTC"), None);
        assert_eq!(parse_offset_hours("UTC 5"), None);
        assert_eq!(parse_offset_hours("EST"), None);
        assert_eq!(parse_offset_hours("UTC+99:99"), None);
        assert_eq!(parse_offset_hours("UTC+5:60"), None);
    }
}
