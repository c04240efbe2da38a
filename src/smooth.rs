//! Windowed filters and least squares polynomial fitting over 1D signals.
use std::collections::VecDeque;
use std::ops::Range;

use cfg_if::cfg_if;
use num_traits::Float;
use thiserror::Error;

/// The bounds of a window of `width` samples centered on `index` in an array
/// of length `n`, truncated at the array edges.
///
/// For even widths the window extends one sample further to the left.
#[inline]
pub fn centered_window(index: usize, width: usize, n: usize) -> Range<usize> {
    let half = width / 2;
    let start = index.saturating_sub(half);
    let end = index.saturating_add(width - half).min(n);
    start..end
}

/// Minimum over a centered window of `width` samples at every position.
///
/// Uses a monotonic queue so the cost does not depend on `width`.
pub fn rolling_min<F: Float>(data: &[F], width: usize) -> Vec<F> {
    let n = data.len();
    let width = width.max(1);
    let mut result = Vec::with_capacity(n);
    let mut queue: VecDeque<usize> = VecDeque::with_capacity(width.min(n));
    let mut next = 0;
    for i in 0..n {
        let window = centered_window(i, width, n);
        while next < window.end {
            while let Some(&back) = queue.back() {
                if data[back] >= data[next] {
                    queue.pop_back();
                } else {
                    break;
                }
            }
            queue.push_back(next);
            next += 1;
        }
        while let Some(&front) = queue.front() {
            if front < window.start {
                queue.pop_front();
            } else {
                break;
            }
        }
        result.push(queue.front().map(|j| data[*j]).unwrap_or_else(F::zero));
    }
    result
}

/// Sample standard deviation (one delta degree of freedom) over a centered
/// window of `width` samples at every position. Windows holding fewer than two
/// samples have a deviation of zero.
pub fn rolling_std<F: Float>(data: &[F], width: usize) -> Vec<F> {
    let n = data.len();
    let width = width.max(1);
    (0..n)
        .map(|i| {
            let window = &data[centered_window(i, width, n)];
            let count = window.len();
            if count < 2 {
                return F::zero();
            }
            let k = F::from(count).unwrap_or_else(F::one);
            let mean = window.iter().fold(F::zero(), |acc, x| acc + *x) / k;
            let ss = window
                .iter()
                .fold(F::zero(), |acc, x| acc + (*x - mean) * (*x - mean));
            (ss / (k - F::one())).sqrt()
        })
        .collect()
}

/// Map an out-of-bounds offset back into `0..n` by mirroring about the array
/// edges, repeating the edge sample (`d c b a | a b c d | d c b a`).
#[inline]
fn reflect_index(k: isize, n: isize) -> usize {
    let period = 2 * n;
    let m = k.rem_euclid(period);
    if m >= n {
        (period - m - 1) as usize
    } else {
        m as usize
    }
}

/// Convolve `data` with a normalized Gaussian kernel of standard deviation
/// `sigma` samples, truncated at four standard deviations.
pub fn gaussian_filter<F: Float>(data: &[F], sigma: f64) -> Vec<F> {
    let n = data.len();
    if n == 0 || sigma <= 0.0 {
        return data.to_vec();
    }
    let radius = (4.0 * sigma + 0.5) as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let total: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= total);

    let ni = n as isize;
    (0..ni)
        .map(|i| {
            let acc = kernel.iter().enumerate().fold(0.0, |acc, (j, w)| {
                let k = reflect_index(i + j as isize - radius, ni);
                acc + w * data[k].to_f64().unwrap_or_default()
            });
            F::from(acc).unwrap_or_else(F::zero)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PolyfitError {
    #[error("A degree {1} polynomial requires more than {1} points, received {0}")]
    TooFewPoints(usize, usize),
    #[error("The x and y arrays differ in length: {0} != {1}")]
    LengthMismatch(usize, usize),
    #[error("Failed to solve for coefficients: {0}")]
    FailedToSolveCoefficients(&'static str),
}

/// A polynomial with coefficients in ascending order of degree.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial<F: Float> {
    coefficients: Vec<F>,
}

impl<F: Float> Polynomial<F> {
    pub fn new(coefficients: Vec<F>) -> Self {
        Self { coefficients }
    }

    pub fn order(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn coefficient(&self, power: usize) -> F {
        self.coefficients.get(power).copied().unwrap_or_else(F::zero)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, F> {
        self.coefficients.iter()
    }

    #[inline]
    pub fn evaluate(&self, x: F) -> F {
        self.coefficients
            .iter()
            .rev()
            .fold(F::zero(), |y, c| y * x + *c)
    }

    pub fn eval(&self, values: &[F]) -> Vec<F> {
        values.iter().map(|v| self.evaluate(*v)).collect()
    }
}

impl<F: Float> AsRef<[F]> for Polynomial<F> {
    fn as_ref(&self) -> &[F] {
        &self.coefficients
    }
}

#[cfg(feature = "nalgebra")]
fn polyfit_nalgebra(x: &[f64], y: &[f64], order: usize) -> Result<Vec<f64>, PolyfitError> {
    use nalgebra::{DMatrix, DVector};

    let nc = order + 1;
    let nr = x.len();

    let system = DMatrix::<f64>::from_fn(nr, nc, |row_i, col_j| x[row_i].powi(col_j as i32));
    let beta = DVector::from_row_slice(y);
    let decomp = nalgebra::linalg::SVD::new(system, true, true);

    match decomp.solve(&beta, 1e-18) {
        Ok(val) => Ok(val.data.into()),
        Err(e) => Err(PolyfitError::FailedToSolveCoefficients(e)),
    }
}

#[allow(unused)]
fn polyfit_normal_equations(x: &[f64], y: &[f64], order: usize) -> Result<Vec<f64>, PolyfitError> {
    let nc = order + 1;
    // Augmented [XᵀX | Xᵀy]
    let mut system = vec![vec![0.0; nc + 1]; nc];
    for (xi, yi) in x.iter().zip(y.iter()) {
        let powers: Vec<f64> = (0..nc).map(|p| xi.powi(p as i32)).collect();
        for r in 0..nc {
            for c in 0..nc {
                system[r][c] += powers[r] * powers[c];
            }
            system[r][nc] += powers[r] * yi;
        }
    }

    for col in 0..nc {
        let pivot = (col..nc)
            .max_by(|a, b| system[*a][col].abs().total_cmp(&system[*b][col].abs()))
            .unwrap_or(col);
        if system[pivot][col].abs() < 1e-14 {
            return Err(PolyfitError::FailedToSolveCoefficients(
                "Normal equations are singular",
            ));
        }
        system.swap(col, pivot);
        for row in 0..nc {
            if row == col {
                continue;
            }
            let factor = system[row][col] / system[col][col];
            for k in col..=nc {
                system[row][k] -= factor * system[col][k];
            }
        }
    }
    Ok((0..nc).map(|r| system[r][nc] / system[r][r]).collect())
}

/// Least squares fit of a polynomial of degree `order` to `(x, y)`.
pub fn polyfit(x: &[f64], y: &[f64], order: usize) -> Result<Polynomial<f64>, PolyfitError> {
    if x.len() != y.len() {
        return Err(PolyfitError::LengthMismatch(x.len(), y.len()));
    }
    if x.len() <= order {
        return Err(PolyfitError::TooFewPoints(x.len(), order));
    }
    cfg_if! {
        if #[cfg(feature = "nalgebra")] {
            let coefficients = polyfit_nalgebra(x, y, order)?;
        } else {
            let coefficients = polyfit_normal_equations(x, y, order)?;
        }
    }
    Ok(Polynomial::new(coefficients))
}
