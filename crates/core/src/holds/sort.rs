//! Multi-key row sorting with locale-style string collation.
//!
//! Comparison is layered the way library staff expect a shelf list to read:
//! accents and case are ignored at first, then accents break ties, then
//! case (lowercase first), then the decomposed code points. Canonically
//! equivalent strings compare equal. Punctuation and spaces
//! sort before digits, digits before letters.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::types::{ReportRow, SortField};

/// Sort `rows` by `keys` in order of precedence.
///
/// The sort is stable: rows equal on every key keep their relative order.
pub fn sort_rows(rows: &mut [ReportRow], keys: &[SortField]) {
    rows.sort_by_cached_key(|row| {
        keys.iter()
            .map(|&field| CollationKey::new(row.field(field)))
            .collect::<Vec<_>>()
    });
}

/// Compare two rows on `keys`.
pub fn compare_rows(a: &ReportRow, b: &ReportRow, keys: &[SortField]) -> Ordering {
    keys.iter()
        .map(|&field| collate(a.field(field), b.field(field)))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Locale-style comparison of two strings.
pub fn collate(a: &str, b: &str) -> Ordering {
    CollationKey::new(a).cmp(&CollationKey::new(b))
}

/// Precomputed sort key for one string. Field order is comparison order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollationKey {
    primary: Vec<(CharClass, char)>,
    accents: Vec<char>,
    case: Vec<bool>,
    decomposed: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Space,
    Punctuation,
    Digit,
    Letter,
    Other,
}

impl CharClass {
    fn of(c: char) -> Self {
        if c.is_whitespace() {
            CharClass::Space
        } else if c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_control()) {
            CharClass::Punctuation
        } else if c.is_numeric() {
            CharClass::Digit
        } else if c.is_alphabetic() {
            CharClass::Letter
        } else {
            CharClass::Other
        }
    }
}

impl CollationKey {
    pub fn new(s: &str) -> Self {
        let mut primary = Vec::with_capacity(s.len());
        let mut accents = Vec::new();
        let mut case = Vec::with_capacity(s.len());
        let decomposed: String = s.nfd().collect();

        for c in decomposed.chars() {
            if is_combining_mark(c) {
                accents.push(c);
                continue;
            }
            // Base characters take a neutral slot so accents align by position.
            accents.push('\0');
            case.push(c.is_uppercase());
            for lower in c.to_lowercase() {
                primary.push((CharClass::of(lower), lower));
            }
        }

        Self {
            primary,
            accents,
            case,
            decomposed,
        }
    }
}
