use crate::{error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// Largest integer value exactly representable as an `f64` (`2^53 - 1`).
pub const MAX_SAFE_U64_INT: u64 = 9_007_199_254_740_991;

/// Most elements an array may be grown to by index assignment, `insert_at`
/// or `range`.
pub const MAX_COLLECTION_LEN: usize = 1 << 24;

/// Fails unless a collection of `requested` elements fits within
/// [`MAX_COLLECTION_LEN`].
///
/// ## Example
/// ```
/// use r2lang::util::num::{MAX_COLLECTION_LEN, check_capacity};
///
/// assert!(check_capacity(10, 1).is_ok());
/// assert!(check_capacity(MAX_COLLECTION_LEN as u64 + 1, 1).is_err());
/// ```
pub fn check_capacity(requested: u64, line: usize) -> EvalResult<()> {
    if usize::try_from(requested).is_ok_and(|n| n <= MAX_COLLECTION_LEN) {
        return Ok(());
    }
    Err(RuntimeError::CapacityExceeded { requested,
                                         limit: MAX_COLLECTION_LEN,
                                         line })
}

/// Converts a collection length or position to a script number.
///
/// Lengths beyond `2^53 - 1` cannot occur for in-memory collections, so the
/// conversion saturates instead of failing.
///
/// ## Example
/// ```
/// use r2lang::util::num::usize_to_f64;
///
/// assert_eq!(usize_to_f64(42), 42.0);
/// ```
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    u64::try_from(value).map_or(MAX_SAFE_U64_INT as f64, |v| v.min(MAX_SAFE_U64_INT) as f64)
}

/// Truncates a number to an `i64` for the bitwise operators.
///
/// Non-finite values become 0 and out-of-range values saturate, mirroring an
/// `as` cast.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn f64_to_i64_truncating(value: f64) -> i64 {
    if value.is_finite() { value.trunc() as i64 } else { 0 }
}

/// Converts an `i64` produced by a bitwise operator back to a number.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub const fn i64_to_f64(value: i64) -> f64 {
    value as f64
}

/// Converts a number to a count, such as a number of permits.
///
/// Returns `None` unless the value is a non-negative integer no larger than
/// `2^53 - 1`.
///
/// ## Example
/// ```
/// use r2lang::util::num::f64_to_count;
///
/// assert_eq!(f64_to_count(3.0), Some(3));
/// assert_eq!(f64_to_count(-1.0), None);
/// assert_eq!(f64_to_count(1.5), None);
/// ```
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn f64_to_count(value: f64) -> Option<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= MAX_SAFE_U64_INT as f64 {
        usize::try_from(f64_to_i64_truncating(value)).ok()
    } else {
        None
    }
}

/// Resolves a script index against a collection of length `len`.
///
/// Negative indices count from the end, so `-1` is the last element. The
/// index must be integral.
///
/// ## Errors
/// - `TypeError` if the index has a fractional part or is not finite.
/// - `IndexOutOfBounds` if the resolved position is outside `0..len`.
///
/// ## Example
/// ```
/// use r2lang::util::num::resolve_index;
///
/// assert_eq!(resolve_index(1.0, 3, 1).unwrap(), 1);
/// assert_eq!(resolve_index(-1.0, 3, 1).unwrap(), 2);
/// assert!(resolve_index(3.0, 3, 1).is_err());
/// assert!(resolve_index(0.5, 3, 1).is_err());
/// ```
pub fn resolve_index(index: f64, len: usize, line: usize) -> EvalResult<usize> {
    let position = resolve_position(index, len, line)?;

    usize::try_from(position).ok()
                             .filter(|p| *p < len)
                             .ok_or(RuntimeError::IndexOutOfBounds { index: f64_to_i64_truncating(index),
                                                                     len,
                                                                     line })
}

/// Like [`resolve_index`] but allows positions at or past the end, which
/// index assignment uses to grow arrays.
///
/// ## Errors
/// - `TypeError` if the index has a fractional part or is not finite.
/// - `IndexOutOfBounds` if a negative index reaches before the start.
/// - `CapacityExceeded` if writing there would grow the array past
///   [`MAX_COLLECTION_LEN`].
pub fn resolve_write_index(index: f64, len: usize, line: usize) -> EvalResult<usize> {
    let position = resolve_position(index, len, line)?;

    let position =
        usize::try_from(position).map_err(|_| RuntimeError::IndexOutOfBounds { index: f64_to_i64_truncating(index),
                                                                               len,
                                                                               line })?;
    if position >= len {
        check_capacity(u64::try_from(position).unwrap_or(u64::MAX).saturating_add(1), line)?;
    }
    Ok(position)
}

fn resolve_position(index: f64, len: usize, line: usize) -> EvalResult<i64> {
    if !index.is_finite() || index.fract() != 0.0 {
        return Err(RuntimeError::TypeError { details: format!("Index must be an integer, found {index}"),
                                             line });
    }

    let index = f64_to_i64_truncating(index);
    if index < 0 {
        let len = i64::try_from(len).unwrap_or(i64::MAX);
        return Ok(index + len);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_write_index_before_start_fails() {
        assert!(resolve_write_index(-4.0, 3, 1).is_err());
        assert_eq!(resolve_write_index(5.0, 3, 1).unwrap(), 5);
    }

    #[test]
    fn write_index_past_the_limit_fails() {
        assert!(matches!(resolve_write_index(1e15, 3, 2),
                         Err(RuntimeError::CapacityExceeded { line: 2, .. })));
        let last = usize_to_f64(MAX_COLLECTION_LEN - 1);
        assert_eq!(resolve_write_index(last, 0, 1).unwrap(), MAX_COLLECTION_LEN - 1);
    }

    #[test]
    fn truncation_handles_non_finite() {
        assert_eq!(f64_to_i64_truncating(f64::NAN), 0);
        assert_eq!(f64_to_i64_truncating(-3.7), -3);
    }
}
