//! Small order statistics used by the background estimator.

/// Scale factor turning a MAD into a Gaussian σ.
pub(crate) const MAD_TO_SIGMA: f64 = 1.482_602_218_505_602;

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance around `center` with `ddof` fitted parameters.
pub(crate) fn variance_about(values: &[f64], center: f64, ddof: usize) -> f64 {
    if values.len() <= ddof {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|v| (v - center) * (v - center)).sum();
    ss / (values.len() - ddof) as f64
}

pub(crate) fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

pub(crate) fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

pub(crate) fn median(values: &[f64]) -> f64 {
    median_of_sorted(&sorted(values))
}

/// Median absolute deviation around `center`.
pub(crate) fn mad(values: &[f64], center: f64) -> f64 {
    let dev: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&dev)
}

/// Trimmed mean and the Tukey-McLaughlin variance of that mean.
///
/// `fraction` is the share removed from each tail; the variance uses the
/// winsorized sample variance divided by `(1 - 2g)^2 n`.
pub(crate) fn trimmed_mean(values: &[f64], fraction: f64) -> (f64, f64) {
    let s = sorted(values);
    let n = s.len();
    let g = ((fraction.clamp(0.0, 0.49)) * n as f64).floor() as usize;
    let kept = &s[g..n - g];
    let tm = mean(kept);

    let lo = s[g];
    let hi = s[n - g - 1];
    let winsorized: Vec<f64> = s.iter().map(|v| v.clamp(lo, hi)).collect();
    let wmean = mean(&winsorized);
    let wvar = variance_about(&winsorized, wmean, 1);
    let keep_frac = kept.len() as f64 / n as f64;
    let var = wvar / (keep_frac * keep_frac * n as f64);
    (tm, var)
}
