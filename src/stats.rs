//! Numeric primitives for the statistics engine
//!
//! Sample statistics use the n-1 denominator. Skewness and kurtosis are the
//! biased moment estimators (kurtosis reported as excess over 3). The normality
//! test is D'Agostino and Pearson's omnibus K² test.

use statrs::distribution::{ChiSquared, ContinuousCDF};
use statrs::statistics::{Data, Median, Statistics};

/// Smallest sample the skewness test is defined for
pub const NORMALITY_MIN_SAMPLES: usize = 8;

/// Arithmetic mean (NaN when empty)
pub fn mean(values: &[f64]) -> f64 {
    values.iter().mean()
}

/// Median (NaN when empty)
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    Data::new(values.to_vec()).median()
}

/// Sample standard deviation (NaN below two values)
pub fn std_dev(values: &[f64]) -> f64 {
    values.iter().std_dev()
}

/// Smallest value (NaN when empty)
pub fn min(values: &[f64]) -> f64 {
    Statistics::min(values.iter())
}

/// Largest value (NaN when empty)
pub fn max(values: &[f64]) -> f64 {
    Statistics::max(values.iter())
}

/// Second, third and fourth central moments
fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let m = mean(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Biased sample skewness; `None` for empty or zero-variance input
pub fn skewness(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let (m2, m3, _) = central_moments(values);
    if m2 <= f64::EPSILON * mean(values).abs().max(1.0) {
        return None;
    }
    Some(m3 / m2.powf(1.5))
}

/// Biased sample kurtosis; `None` for empty or zero-variance input
fn kurtosis(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let (m2, _, m4) = central_moments(values);
    if m2 <= f64::EPSILON * mean(values).abs().max(1.0) {
        return None;
    }
    Some(m4 / (m2 * m2))
}

/// Excess (Fisher) kurtosis
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    kurtosis(values).map(|k| k - 3.0)
}

/// Omnibus normality test result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalityTest {
    /// K² statistic (sum of squared skewness and kurtosis z-scores)
    pub statistic: f64,
    pub p_value: f64,
}

/// D'Agostino-Pearson K² test; `None` below [`NORMALITY_MIN_SAMPLES`] or for
/// zero-variance data
pub fn normality_test(values: &[f64]) -> Option<NormalityTest> {
    if values.len() < NORMALITY_MIN_SAMPLES {
        return None;
    }
    let z_skew = skew_z_score(values)?;
    let z_kurt = kurtosis_z_score(values)?;
    let statistic = z_skew * z_skew + z_kurt * z_kurt;
    if !statistic.is_finite() {
        return None;
    }

    let p_value = ChiSquared::new(2.0).map(|dist| dist.sf(statistic)).ok()?;
    Some(NormalityTest { statistic, p_value })
}

fn skew_z_score(values: &[f64]) -> Option<f64> {
    let b2 = skewness(values)?;
    let n = values.len() as f64;

    let mut y = b2 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    if y == 0.0 {
        y = 1.0;
    }
    let ratio = y / alpha;
    Some(delta * (ratio + (ratio * ratio + 1.0).sqrt()).ln())
}

fn kurtosis_z_score(values: &[f64]) -> Option<f64> {
    let b2 = kurtosis(values)?;
    let n = values.len() as f64;

    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / variance.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return None;
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    Some((term1 - term2) / (2.0 / (9.0 * a)).sqrt())
}

/// Pearson correlation; `None` for mismatched lengths, fewer than two pairs or a
/// constant series
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 || is_constant(x) || is_constant(y) {
        return None;
    }
    let r = x.iter().covariance(y.iter()) / (std_dev(x) * std_dev(y));
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Most frequent value, ties resolved to the smallest
pub fn mode(values: &[u32]) -> Option<u32> {
    let mut counts = std::collections::BTreeMap::new();
    for v in values {
        *counts.entry(*v).or_insert(0usize) += 1;
    }
    // max_by_key keeps the last maximum; descending order makes that the smallest value
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| value)
}

/// Round to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
