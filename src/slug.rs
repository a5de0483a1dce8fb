//! Deterministic slug derivation.
//!
//! Two distinct rules live here on purpose and must not be unified:
//!
//! - [`slugify`] builds the composite feature slug components. It folds
//!   every run of non-alphanumeric characters to a single hyphen.
//! - [`class_name_slug`] maps a class display name to its API path /
//!   source-file token by joining lowercase whitespace-split words.
//!
//! Unifying them would change observable API routing for names
//! containing punctuation.

/// Slug rule for feature identifiers.
///
/// Lowercase, every maximal run of non `[a-z0-9]` characters becomes a
/// single hyphen, leading/trailing hyphens stripped.
///
/// `"Second Wind"` → `"second-wind"`,
/// `"Rage (2/long rest)"` → `"rage-2-long-rest"`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        let lc = c.to_ascii_lowercase();
        if lc.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(lc);
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Stable composite key for a normalized feature:
/// `<class-slug>-<feature-slug>-l<level>`.
pub fn feature_slug(class_name: &str, feature_name: &str, level: i64) -> String {
    format!(
        "{}-{}-l{}",
        slugify(class_name),
        slugify(feature_name),
        level
    )
}

/// Simple slug rule for class display names used in API paths and
/// source filenames: lowercase, whitespace-split, hyphen-joined. No
/// special-character folding.
///
/// `"Fighter"` → `"fighter"`, `"Arcane Trickster"` → `"arcane-trickster"`.
pub fn class_name_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
