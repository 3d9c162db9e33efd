//! Request payload validation.
//!
//! A `Validator` accumulates field errors over a decoded payload; handlers
//! run their checks, then consult `valid()` before touching domain logic.
//! The rule predicates are pure functions so they compose freely across
//! resource types.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::LazyLock;

use regex::Regex;

/// Pattern for structurally plausible email addresses.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
        .expect("email regex is valid")
});

/// Accumulator for validation errors, one message per field.
#[derive(Debug, Default)]
pub struct Validator {
    /// Field name -> first failure message recorded for that field.
    pub errors: HashMap<String, String>,
}

impl Validator {
    /// Create an empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff no checks have failed.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record `message` for `field` unless the field already has an error.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record `message` for `field` if `ok` is false.
    ///
    /// The first failure per field wins; later checks on the same field
    /// are suppressed.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }
}

/// True iff `value` matches `pattern`.
pub fn matches(value: &str, pattern: &Regex) -> bool {
    pattern.is_match(value)
}

/// True iff no two elements of `values` are equal.
///
/// Empty and single-element slices are trivially unique.
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let distinct: HashSet<&T> = values.iter().collect();
    distinct.len() == values.len()
}

/// True iff `value` equals some element of `candidates`.
///
/// An empty candidate list never matches.
pub fn permitted<T: PartialEq>(value: &T, candidates: &[T]) -> bool {
    candidates.contains(value)
}

/// True iff `min <= value <= max`.
pub fn between<T: PartialOrd>(value: T, min: T, max: T) -> bool {
    value >= min && value <= max
}

/// True iff `value` is at most `n` characters long.
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// True iff `value` contains a non-whitespace character.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}
