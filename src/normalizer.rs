//! Canonicalization of names and slugs into store keys.

use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::schema::CanonicalId;

const APOSTROPHES: [char; 5] = ['\'', '\u{2019}', '\u{2018}', '\u{02BC}', '`'];

/// Combining Diacritical Marks block.  Kana voicing marks and Hangul jamo are not in it.
fn is_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
}

/// Turns display names and URL slugs into [`CanonicalId`]s.
///
/// Folding only covers what Unicode decomposition provides (Latin diacritics,
/// compatibility forms such as full-width letters).  Anything beyond that,
/// e.g. Greek rank suffixes, must come from configured transliterations.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Normalizer {
    /// `(from, to)` substitutions applied to the raw text, in order.
    #[serde(default)]
    transliterations: Vec<(String, String)>,
}

impl Normalizer {
    pub fn with_transliterations(transliterations: Vec<(String, String)>) -> Self {
        Self { transliterations }
    }

    pub fn normalize(&self, text: &str) -> CanonicalId {
        let mut text = text.to_owned();
        for (from, to) in &self.transliterations {
            if !from.is_empty() {
                text = text.replace(from.as_str(), to);
            }
        }

        let mut key = String::with_capacity(text.len());
        let mut pending_separator = false;
        let folded = text
            .nfkd()
            .filter(|&c| !is_diacritic(c))
            .flat_map(char::to_lowercase)
            .filter(|&c| !is_diacritic(c) && !APOSTROPHES.contains(&c))
            .nfc();
        for c in folded {
            if c.is_alphanumeric() {
                if pending_separator && !key.is_empty() {
                    key.push('-');
                }
                pending_separator = false;
                key.push(c);
            } else {
                pending_separator = true;
            }
        }
        key.into()
    }

    /// Fallback match between two keys: either contains the other.
    pub fn matches(key: &CanonicalId, candidate: &CanonicalId) -> bool {
        if key.is_empty() || candidate.is_empty() {
            return false;
        }
        key.as_str().contains(candidate.as_str()) || candidate.as_str().contains(key.as_str())
    }
}
