use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Derive a stable cache-key/id slug from human text.
///
/// Lower-cases, collapses every run of non-alphanumeric characters (spaces,
/// slashes, punctuation) into a single hyphen, and strips hyphens from both
/// ends. Run and sheet names are keyed by this, so two names may not differ
/// only in punctuation.
pub fn string_to_id(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_ALNUM
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
