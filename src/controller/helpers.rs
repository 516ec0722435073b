//! Shared helpers for controller modules.

use crate::error::Result;

/// Field manager name used for server-side apply patches.
pub const FIELD_MANAGER: &str = "apiplatform-operator";

/// How a [`find_exactly_one`] lookup failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FindOneError {
    Missing,
    Ambiguous { count: usize },
}

impl FindOneError {
    /// Number of matches the failed lookup saw.
    pub fn count(&self) -> usize {
        match self {
            FindOneError::Missing => 0,
            FindOneError::Ambiguous { count } => *count,
        }
    }
}

/// Index of the single element satisfying `pred`, or how the lookup failed.
///
/// Scans the whole slice so that a second match is reported as ambiguity
/// rather than silently picking the first. Used for trigger lookups, where
/// zero or duplicate matches indicate an unmigrated or tampered object.
pub fn find_exactly_one<T>(
    items: &[T],
    pred: impl Fn(&T) -> bool,
) -> Result<usize, FindOneError> {
    let mut found = None;
    let mut count = 0;
    for (i, item) in items.iter().enumerate() {
        if pred(item) {
            count += 1;
            found.get_or_insert(i);
        }
    }
    match (found, count) {
        (Some(i), 1) => Ok(i),
        (None, _) => Err(FindOneError::Missing),
        (_, count) => Err(FindOneError::Ambiguous { count }),
    }
}
