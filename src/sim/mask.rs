//! Combinatorial enumeration of legal joint actions.
//!
//! Enumeration walks the full integer lattice of per-battery intervals, so
//! its cost is the product of the interval widths. It is meant for a handful
//! of batteries with narrow ranges; every entry point takes a `limit` and
//! refuses lattices larger than that.

use itertools::Itertools;

use crate::error::SimError;

/// Default largest lattice the stepper will enumerate.
pub const DEFAULT_MASK_LIMIT: u64 = 100_000;

/// Number of integer points in the box described by `bounds`.
///
/// Returns `None` on overflow. Empty intervals (`low > high`) yield 0.
pub fn lattice_size(bounds: &[(i64, i64)]) -> Option<u128> {
    bounds.iter().try_fold(1_u128, |acc, &(low, high)| {
        let width = if high < low {
            0
        } else {
            u128::try_from(i128::from(high) - i128::from(low) + 1).ok()?
        };
        acc.checked_mul(width)
    })
}

/// Enumerates every integer action inside `bounds`.
///
/// # Errors
///
/// Returns `SimError::MaskTooLarge` if the lattice holds more than `limit`
/// points.
pub fn enumerate_lattice(bounds: &[(i64, i64)], limit: u64) -> Result<Vec<Vec<i64>>, SimError> {
    let size = lattice_size(bounds).unwrap_or(u128::MAX);
    if size > u128::from(limit) {
        tracing::warn!(size = %size, limit, "refusing to enumerate action lattice");
        return Err(SimError::MaskTooLarge { size, limit });
    }
    if bounds.is_empty() {
        return Ok(vec![Vec::new()]);
    }

    Ok(bounds
        .iter()
        .map(|&(low, high)| low..=high)
        .multi_cartesian_product()
        .collect())
}

/// Enumerates the actions inside `bounds` whose components sum to `target`.
///
/// # Errors
///
/// Returns `SimError::MaskTooLarge` if the lattice holds more than `limit`
/// points.
pub fn balanced_actions(
    bounds: &[(i64, i64)],
    target: i64,
    limit: u64,
) -> Result<Vec<Vec<i64>>, SimError> {
    Ok(enumerate_lattice(bounds, limit)?
        .into_iter()
        .filter(|action| action.iter().sum::<i64>() == target)
        .collect())
}

/// Returns true if some integer action inside `bounds` sums to `target`.
///
/// Interval arithmetic over the box: constant time in the range widths.
pub fn balance_feasible(bounds: &[(i64, i64)], target: i64) -> bool {
    if bounds.iter().any(|&(low, high)| low > high) {
        return false;
    }
    let low: i128 = bounds.iter().map(|&(low, _)| i128::from(low)).sum();
    let high: i128 = bounds.iter().map(|&(_, high)| i128::from(high)).sum();
    (low..=high).contains(&i128::from(target))
}
