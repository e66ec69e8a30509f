//! Deterministic arg-max used to pick which generator to force offline.

use crate::error::{DecomError, DecomResult};

/// Return the maximum value and the index that attains it.
///
/// Ties resolve to the lowest index. NaN entries never win; an empty slice or a slice
/// containing only NaN is a validation error. `+inf` is a legal maximum (a unit with a
/// zero floor and a positive no-load cost has infinite average cost at Pmin).
pub fn fairmax(values: &[f64]) -> DecomResult<(f64, usize)> {
    if values.is_empty() {
        return Err(DecomError::Validation("fairmax of an empty sequence".into()));
    }

    let mut best: Option<(f64, usize)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((b, _)) if v <= b => {}
            _ => best = Some((v, i)),
        }
    }

    best.ok_or_else(|| DecomError::Validation("fairmax: every value is NaN".into()))
}
