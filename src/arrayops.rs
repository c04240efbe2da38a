//! Paired time/intensity arrays and the small numeric helpers that operate on them.
use std::borrow::Cow;
use std::iter::Sum;

use num_traits::{Float, ToPrimitive};

/// A chromatogram as a pair of parallel arrays, borrowed or owned.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChromatogramArrays<'a> {
    pub time_array: Cow<'a, [f64]>,
    pub intensity_array: Cow<'a, [f64]>,
}

impl<'a> ChromatogramArrays<'a> {
    pub fn new(time_array: Vec<f64>, intensity_array: Vec<f64>) -> ChromatogramArrays<'static> {
        ChromatogramArrays {
            time_array: Cow::Owned(time_array),
            intensity_array: Cow::Owned(intensity_array),
        }
    }

    /// Wrap borrowed slices without copying them
    pub fn wrap(time_array: &'a [f64], intensity_array: &'a [f64]) -> Self {
        Self {
            time_array: Cow::Borrowed(time_array),
            intensity_array: Cow::Borrowed(intensity_array),
        }
    }

    pub fn borrow(&self) -> ChromatogramArrays<'_> {
        ChromatogramArrays::wrap(&self.time_array, &self.intensity_array)
    }

    pub fn into_owned(self) -> ChromatogramArrays<'static> {
        ChromatogramArrays {
            time_array: Cow::Owned(self.time_array.into_owned()),
            intensity_array: Cow::Owned(self.intensity_array.into_owned()),
        }
    }

    pub fn len(&self) -> usize {
        self.time_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_array.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(f64, f64)> {
        match (self.time_array.get(index), self.intensity_array.get(index)) {
            (Some(t), Some(i)) => Some((*t, *i)),
            _ => None,
        }
    }

    pub fn start_time(&self) -> Option<f64> {
        self.time_array.first().copied()
    }

    pub fn end_time(&self) -> Option<f64> {
        self.time_array.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time_array
            .iter()
            .copied()
            .zip(self.intensity_array.iter().copied())
    }
}

impl From<(Vec<f64>, Vec<f64>)> for ChromatogramArrays<'static> {
    fn from((time_array, intensity_array): (Vec<f64>, Vec<f64>)) -> Self {
        ChromatogramArrays::new(time_array, intensity_array)
    }
}

/// An evenly spaced grid from `start` to `end`, including `end` when the
/// distance is a whole number of steps.
pub fn gridspace<T: Float + ToPrimitive>(start: T, end: T, step: T) -> Vec<T> {
    let distance = end - start;
    if step <= T::zero() || distance < T::zero() {
        return Vec::new();
    }
    let steps = (distance / step)
        .round()
        .to_usize()
        .unwrap_or_default();
    let mut result = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let x = start + T::from(i).unwrap_or_else(T::zero) * step;
        if x > end + step / T::from(2.0).unwrap_or_else(T::one) {
            break;
        }
        result.push(x);
    }
    result
}

/// Trapezoidal integration of `y` over `x`
pub fn trapz<T: Float + Sum>(x: &[T], y: &[T]) -> T {
    let n = x.len().min(y.len());
    if n < 2 {
        return T::zero();
    }
    let half = T::from(0.5).unwrap_or_else(T::zero);
    (0..n - 1)
        .map(|i| (x[i + 1] - x[i]) * half * (y[i + 1] + y[i]))
        .sum()
}

pub fn minmax<T: Float>(values: &[T]) -> (T, T) {
    let mut max = -T::infinity();
    let mut min = T::infinity();

    for v in values.iter() {
        if *v > max {
            max = *v;
        }
        if *v < min {
            min = *v
        }
    }
    (min, max)
}

/// The median of `values`, averaging the two central values for even lengths.
///
/// Returns zero for an empty slice.
pub fn median<T: Float>(values: &[T]) -> T {
    if values.is_empty() {
        return T::zero();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / (T::one() + T::one())
    }
}

/// Check if the value in `it` are monotonically ascending or flat
pub fn is_increasing<F: Float + PartialOrd>(it: &[F]) -> bool {
    it.windows(2).all(|w| w[0] <= w[1])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gridspace_inclusive() {
        let grid = gridspace(0.0, 10.0, 0.01);
        assert_eq!(grid.len(), 1001);
        assert!((grid[1000] - 10.0).abs() < 1e-9);

        let grid = gridspace(2.0, 1.0, 0.1);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_trapz() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 1.0, 0.0];
        assert!((trapz(&x, &y) - 2.0).abs() < 1e-12);
        assert_eq!(trapz(&x[..1], &y[..1]), 0.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median::<f64>(&[]), 0.0);
    }

    #[test]
    fn test_arrays() {
        let time = [0.0, 0.5, 1.0];
        let intensity = [1.0, 2.0, 3.0];
        let arrays = ChromatogramArrays::wrap(&time, &intensity);
        assert_eq!(arrays.len(), 3);
        assert_eq!(arrays.get(1), Some((0.5, 2.0)));
        assert_eq!(arrays.get(3), None);
        assert_eq!(arrays.end_time(), Some(1.0));
        assert!(is_increasing(&arrays.time_array));
        let owned = arrays.into_owned();
        assert_eq!(owned.iter().map(|(_, i)| i).sum::<f64>(), 6.0);
    }
}
