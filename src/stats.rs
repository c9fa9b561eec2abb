//! Descriptive statistics over paired samples.
//!
//! Undefined results (constant field, fewer than two points) are `None`,
//! never coerced to zero. Constancy is decided on the raw samples, not on a
//! centered sum that rounding can leave slightly above zero.

use polars::prelude::*;
use serde::Serialize;

/// Degree-1 least-squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

fn chunked(name: &str, values: &[f64]) -> Float64Chunked {
    Float64Chunked::from_slice(name.into(), values)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    chunked("values", values).mean()
}

pub fn median(values: &[f64]) -> Option<f64> {
    chunked("values", values).median()
}

/// True when every sample equals the first one (or there are none).
pub fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Pearson correlation coefficient, clamped to [-1, 1] against rounding.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 || is_constant(xs) || is_constant(ys) {
        return None;
    }
    let r = polars_ops::chunked_array::cov::pearson_corr(&chunked("x", xs), &chunked("y", ys))?;
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Ordinary least squares of `ys` on `xs`. Needs variance in `xs` only.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    if xs.len() != ys.len() || xs.len() < 2 || is_constant(xs) {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let (sxx, sxy) = xs.iter().zip(ys).fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        let dx = x - mx;
        (sxx + dx * dx, sxy + dx * (y - my))
    });
    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    (slope.is_finite() && intercept.is_finite()).then_some(LinearFit { slope, intercept })
}
