//! Quadrature weights.
//!
//! Every rule is linear in the samples, `I = Σ w_i y_i`, so the same weights
//! feed both the integral and the variance propagation.

use super::options::IntegrationRule;

/// Weights for samples at `xs` (strictly increasing).
pub fn quadrature_weights(xs: &[f64], rule: IntegrationRule, mean_spacing: f64) -> Vec<f64> {
    match rule {
        IntegrationRule::Trapezoid => trapezoid(xs),
        IntegrationRule::Simpson => simpson(xs),
        IntegrationRule::Sum => vec![mean_spacing; xs.len()],
    }
}

fn trapezoid(xs: &[f64]) -> Vec<f64> {
    let mut w = vec![0.0; xs.len()];
    for i in 0..xs.len().saturating_sub(1) {
        let h = 0.5 * (xs[i + 1] - xs[i]);
        w[i] += h;
        w[i + 1] += h;
    }
    w
}

fn simpson(xs: &[f64]) -> Vec<f64> {
    let n = xs.len();
    if n < 3 {
        return trapezoid(xs);
    }
    let mut w = vec![0.0; n];
    let intervals = n - 1;
    let mut i = 0;
    while i + 2 < n {
        let h0 = xs[i + 1] - xs[i];
        let h1 = xs[i + 2] - xs[i + 1];
        let c = (h0 + h1) / 6.0;
        w[i] += c * (2.0 - h1 / h0);
        w[i + 1] += c * (h0 + h1) * (h0 + h1) / (h0 * h1);
        w[i + 2] += c * (2.0 - h0 / h1);
        i += 2;
    }
    if intervals % 2 == 1 {
        let h = 0.5 * (xs[n - 1] - xs[n - 2]);
        w[n - 2] += h;
        w[n - 1] += h;
    }
    w
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrate(xs: &[f64], f: impl Fn(f64) -> f64, rule: IntegrationRule) -> f64 {
        let w = quadrature_weights(xs, rule, 0.0);
        xs.iter().zip(&w).map(|(&x, &wi)| wi * f(x)).sum()
    }

    #[test]
    fn trapezoid_is_exact_for_lines_on_uneven_grid() {
        let xs = [0.0, 0.3, 1.0, 1.1, 2.5];
        let got = integrate(&xs, |x| 2.0 * x + 1.0, IntegrationRule::Trapezoid);
        assert!((got - 8.75).abs() < 1e-12);
    }

    #[test]
    fn simpson_is_exact_for_quadratics_on_uneven_grid() {
        let xs = [0.0, 0.4, 1.0, 1.3, 2.0];
        let got = integrate(&xs, |x| x * x, IntegrationRule::Simpson);
        assert!((got - 8.0 / 3.0).abs() < 1e-12, "got={got}");
    }

    #[test]
    fn sum_rule_uses_mean_spacing() {
        let w = quadrature_weights(&[0.0, 1.0, 2.0], IntegrationRule::Sum, 0.5);
        assert_eq!(w, vec![0.5; 3]);
    }
}
