//! Searching sorted coordinate axes, e.g. retention times.
use num_traits::Float;

/// The insertion point of `q` in the sorted `array`
pub fn binsearch<T: Float>(array: &[T], q: T) -> usize {
    match array.binary_search_by(|x| x.partial_cmp(&q).unwrap_or(std::cmp::Ordering::Less)) {
        Ok(i) => i,
        Err(i) => i,
    }
}

/// The index of the value in the sorted `array` closest to `target_val`.
///
/// Returns `None` when `array` is empty.
pub fn nearest<T: Float>(array: &[T], target_val: T) -> Option<usize> {
    let n = array.len();
    if n == 0 {
        return None;
    }
    let i = binsearch(array, target_val);
    if i == 0 {
        return Some(0);
    }
    if i >= n {
        return Some(n - 1);
    }
    let below = (target_val - array[i - 1]).abs();
    let above = (array[i] - target_val).abs();
    if below <= above {
        Some(i - 1)
    } else {
        Some(i)
    }
}

/// The half-open index range of values in the sorted `array` that lie within `[lo, hi]`.
pub fn find_between<T: Float>(array: &[T], lo: T, hi: T) -> std::ops::Range<usize> {
    if lo > hi {
        return 0..0;
    }
    let start = array.partition_point(|x| *x < lo);
    let end = array.partition_point(|x| *x <= hi);
    start..end.max(start)
}
