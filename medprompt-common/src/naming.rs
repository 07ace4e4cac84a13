//! Reversible transliteration between display labels and canonical keys
//!
//! A display label like "Weight (kg)" becomes the canonical key
//! "weight_in_kg"; template placeholders and JSON records carry the
//! canonical form. Each rewrite has its own marker token (`_per_`, `_dot_`,
//! `_minus_`, `_in_`) so the transform can be inverted. Known collision: a
//! label whose own words spell a marker reads back as that marker, so
//! "Lab In Results" comes back as "Lab (results)".

use regex::Regex;

/// Convert a display label to its canonical machine key.
///
/// Lowercases, rewrites punctuation into marker tokens, turns spaces into
/// underscores, strips anything outside `[a-z0-9_.#]`, and collapses
/// underscore runs.
pub fn to_canonical(label: &str) -> String {
    let mut key = label.to_lowercase();
    key = key.replace('/', "_per_");
    key = key.replace('.', "_dot_");
    key = key.replace('-', "_minus_");

    let parens = Regex::new(r"\(([^)]*)\)").unwrap();
    key = parens.replace_all(&key, "_in_$1").into_owned();
    key = key.replace(' ', "_");
    key.retain(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '#'));

    let runs = Regex::new(r"_{2,}").unwrap();
    let key = runs.replace_all(&key, "_");
    key.trim_matches('_').to_string()
}

/// Convert a canonical key back to its title-cased display label.
pub fn from_canonical(key: &str) -> String {
    let in_marker = Regex::new(r"_in_([a-z0-9.#]+)").unwrap();
    let mut label = in_marker.replace_all(key, " ($1)").into_owned();
    label = label.replace("_per_", "/");
    label = label.replace("_dot_", ".");
    label = label.replace("_minus_", "-");
    label = label.replace('_', " ");
    title_case(&label)
}

/// Capitalize each word that starts with an ASCII letter. Words opening
/// with punctuation (unit suffixes like "(kg)") are left alone so the
/// canonical round trip stays exact.
fn title_case(label: &str) -> String {
    label
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) if first.is_ascii_alphabetic() => {
                    first.to_ascii_uppercase().to_string() + chars.as_str()
                }
                Some(first) => first.to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
