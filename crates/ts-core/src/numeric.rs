use crate::TsError;

/// Floating point type used throughout the workspace.
pub type Real = f64;

/// Absolute and relative tolerance pair for float comparisons.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, TsError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TsError::NonFinite { what, value: v })
    }
}

/// Finite and strictly greater than zero.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, TsError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(TsError::NonPositive { what, value: v })
    }
}

/// Weighted harmonic mean of two conductivities. Zero if either side is zero.
pub fn harmonic_mean(a: Real, b: Real) -> Real {
    let sum = a + b;
    if sum == 0.0 { 0.0 } else { 2.0 * a * b / sum }
}

/// Series combination of two conductances `1 / (1/a + 1/b)`.
pub fn series(a: Real, b: Real) -> Real {
    if a <= 0.0 || b <= 0.0 {
        0.0
    } else {
        a * b / (a + b)
    }
}

/// First derivative of evenly spaced samples.
///
/// Central differences inside, one-sided differences at both ends. Fewer
/// than two samples give a zero slope.
pub fn gradient(values: &[Real], spacing: Real, out: &mut [Real]) {
    let n = values.len();
    debug_assert_eq!(out.len(), n);
    if n < 2 {
        out.fill(0.0);
        return;
    }
    out[0] = (values[1] - values[0]) / spacing;
    out[n - 1] = (values[n - 1] - values[n - 2]) / spacing;
    for i in 1..n - 1 {
        out[i] = (values[i + 1] - values[i - 1]) / (2.0 * spacing);
    }
}

/// Centered moving average with the window truncated at both ends.
///
/// The window is clamped to `[1, values.len()]`; an even window takes one more
/// sample below the centre than above it.
pub fn moving_average(values: &[Real], window: usize, out: &mut [Real]) {
    let n = values.len();
    debug_assert_eq!(out.len(), n);
    if n == 0 {
        return;
    }
    let window = window.clamp(1, n);
    let above = (window - 1) / 2;
    let below = window - 1 - above;
    for (i, slot) in out.iter_mut().enumerate() {
        let lo = i.saturating_sub(above);
        let hi = (i + below).min(n - 1);
        let span = &values[lo..=hi];
        *slot = span.iter().sum::<Real>() / span.len() as Real;
    }
}
