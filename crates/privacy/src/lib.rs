//! Heuristic PII gate for captured values.
//!
//! The pattern set is deliberately small and pinned: credit-card numbers for
//! the major issuers and SSN-shaped strings. False negatives/positives are an
//! accepted tradeoff of regex-based detection, not a correctness bug.

use once_cell::sync::Lazy;
use regex::Regex;

const CC_PATTERN: &str = r"(?:4[0-9]{12}(?:[0-9]{3})?|5[1-5][0-9]{14}|6(?:011|5[0-9]{2})[0-9]{12}|3[47][0-9]{13}|3(?:0[0-5]|[68][0-9])[0-9]{11}|(?:2131|1800|35[0-9]{3})[0-9]{11})";
const SSN_PATTERN: &str = r"\d{3}-?\d{2}-?\d{4}";

static CC_ANCHORED: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{CC_PATTERN}$")).expect("static pattern"));
static CC_EMBEDDED: Lazy<Regex> = Lazy::new(|| Regex::new(CC_PATTERN).expect("static pattern"));
static SSN_ANCHORED: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{SSN_PATTERN}$")).expect("static pattern"));
static SSN_EMBEDDED: Lazy<Regex> = Lazy::new(|| Regex::new(SSN_PATTERN).expect("static pattern"));

/// Decide whether a string value is safe to capture.
///
/// The value is trimmed first. Dashes and spaces are stripped before the
/// credit-card check so formatted numbers still match. With `anchored` the
/// entire value must be a match to be rejected; without it any embedded match
/// rejects, which is the mode used when scanning free text.
pub fn should_capture_value(value: &str, anchored: bool) -> bool {
    let trimmed = value.trim();
    let compact: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect();
    let (cc, ssn): (&Regex, &Regex) = if anchored {
        (&CC_ANCHORED, &SSN_ANCHORED)
    } else {
        (&CC_EMBEDDED, &SSN_EMBEDDED)
    };
    if cc.is_match(&compact) {
        return false;
    }
    if ssn.is_match(trimmed) {
        return false;
    }
    true
}
