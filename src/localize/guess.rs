//! Initial parameters derived from the data alone.

use super::options::{LocalizerOptions, Polarity};
use crate::background::BackgroundModel;
use crate::signal::Signal;
use log::warn;
use serde::Serialize;

/// FWHM of a unit Gaussian, `2·sqrt(2·ln 2)`.
pub(crate) const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949;

/// Starting point handed to the least-squares fit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialGuess {
    pub amplitude: f64,
    pub center: f64,
    pub width: f64,
    pub offset: f64,
    pub peak_index: usize,
}

pub(crate) fn initial_guess(signal: &Signal, bg: &BackgroundModel, polarity: Polarity) -> InitialGuess {
    let xs = signal.positions();
    let residual: Vec<f64> = xs
        .iter()
        .zip(signal.values())
        .map(|(&x, &y)| y - bg.at(x))
        .collect();

    let argmax = extremum(&residual, |a, b| a > b);
    let argmin = extremum(&residual, |a, b| a < b);
    let peak_index = match polarity {
        Polarity::Positive => argmax,
        Polarity::Negative => argmin,
        Polarity::Auto => {
            if residual[argmax].abs() >= residual[argmin].abs() {
                argmax
            } else {
                argmin
            }
        }
    };
    let amplitude = residual[peak_index];
    let center = xs[peak_index];
    let fallback = signal.span() / 10.0;

    let width = if amplitude == 0.0 {
        fallback
    } else {
        // Work on the sign-normalised residual so both polarities share code.
        let sign = amplitude.signum();
        let v: Vec<f64> = residual.iter().map(|r| r * sign).collect();
        let half = 0.5 * amplitude.abs();
        let left = crossing_left(xs, &v, peak_index, half).map(|x| center - x);
        let right = crossing_right(xs, &v, peak_index, half).map(|x| x - center);
        match (left, right) {
            (Some(l), Some(r)) => (l + r) / FWHM_PER_SIGMA,
            (Some(h), None) | (None, Some(h)) => 2.0 * h / FWHM_PER_SIGMA,
            (None, None) => {
                warn!("initial_guess: no half-maximum crossing, width falls back to span/10");
                fallback
            }
        }
    };

    InitialGuess {
        amplitude,
        center,
        width: width.max(signal.mean_spacing()),
        offset: bg.at(center),
        peak_index,
    }
}

/// Replace guess fields with the caller's hints.
///
/// A center hint moves the peak to the nearest sample; the amplitude is then
/// re-read from the data against the (possibly hinted) offset.
pub(crate) fn apply_hints(
    guess: InitialGuess,
    signal: &Signal,
    bg: &BackgroundModel,
    opts: &LocalizerOptions,
) -> InitialGuess {
    if opts.center_hint.is_none() && opts.width_hint.is_none() && opts.offset_hint.is_none() {
        return guess;
    }
    let xs = signal.positions();
    let (center, peak_index) = match opts.center_hint {
        Some(hint) => (hint, nearest_index(xs, hint)),
        None => (guess.center, guess.peak_index),
    };
    let offset = match opts.offset_hint {
        Some(hint) => hint,
        None => bg.at(center),
    };
    let width = opts.width_hint.unwrap_or(guess.width).max(signal.mean_spacing());
    InitialGuess {
        amplitude: signal.values()[peak_index] - offset,
        center,
        width,
        offset,
        peak_index,
    }
}

fn nearest_index(xs: &[f64], x: f64) -> usize {
    let right = xs.partition_point(|&v| v < x);
    if right == 0 {
        return 0;
    }
    if right == xs.len() {
        return xs.len() - 1;
    }
    if x - xs[right - 1] <= xs[right] - x {
        right - 1
    } else {
        right
    }
}

fn extremum(values: &[f64], better: impl Fn(f64, f64) -> bool) -> usize {
    let mut best = 0usize;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if better(v, values[best]) {
            best = i;
        }
    }
    best
}

fn crossing_left(xs: &[f64], v: &[f64], peak: usize, half: f64) -> Option<f64> {
    let mut j = peak;
    while j > 0 {
        if v[j - 1] <= half {
            let t = (v[j] - half) / (v[j] - v[j - 1]);
            return Some(xs[j] - t * (xs[j] - xs[j - 1]));
        }
        j -= 1;
    }
    None
}

fn crossing_right(xs: &[f64], v: &[f64], peak: usize, half: f64) -> Option<f64> {
    let mut j = peak;
    while j + 1 < v.len() {
        if v[j + 1] <= half {
            let t = (v[j] - half) / (v[j] - v[j + 1]);
            return Some(xs[j] + t * (xs[j + 1] - xs[j]));
        }
        j += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::{self, BackgroundOptions};
    use crate::signal::NoiseModel;

    fn gaussian_signal(amp: f64, center: f64, sigma: f64, offset: f64) -> Signal {
        let values = (0..400)
            .map(|i| {
                let x = i as f64 * 0.25;
                offset + amp * (-(x - center).powi(2) / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        Signal::uniform(0.0, 0.25, values, NoiseModel::Constant(0.0)).unwrap()
    }

    #[test]
    fn guess_from_half_maximum() {
        let signal = gaussian_signal(4.0, 40.0, 3.0, 1.0);
        let bg = background::preliminary(&signal, &BackgroundOptions::default());
        let guess = initial_guess(&signal, &bg, Polarity::Auto);
        assert_eq!(guess.center, 40.0);
        assert!((guess.amplitude - 4.0).abs() < 1e-9);
        assert!((guess.width - 3.0).abs() < 0.05, "width={}", guess.width);
    }

    #[test]
    fn auto_polarity_picks_negative_pulse() {
        let signal = gaussian_signal(-6.0, 70.0, 2.0, 0.5);
        let bg = background::preliminary(&signal, &BackgroundOptions::default());
        let guess = initial_guess(&signal, &bg, Polarity::Auto);
        assert_eq!(guess.center, 70.0);
        assert!(guess.amplitude < 0.0);
        assert!((guess.width - 2.0).abs() < 0.05, "width={}", guess.width);
    }

    #[test]
    fn one_sided_pulse_mirrors_available_half() {
        let signal = gaussian_signal(5.0, 0.0, 4.0, 0.0);
        let bg = background::preliminary(&signal, &BackgroundOptions::default());
        let guess = initial_guess(&signal, &bg, Polarity::Positive);
        assert_eq!(guess.peak_index, 0);
        assert!((guess.width - 4.0).abs() < 0.1, "width={}", guess.width);
    }

    #[test]
    fn hints_override_a_misleading_extremum() {
        // Narrow spike at 80 dominates; the feature of interest sits at 30.
        let values = (0..400)
            .map(|i| {
                let x = i as f64 * 0.25;
                let broad = 4.0 * (-(x - 30.0).powi(2) / (2.0 * 3.0 * 3.0)).exp();
                let spike = if i == 320 { 5.0 } else { 0.0 };
                1.0 + broad + spike
            })
            .collect();
        let signal = Signal::uniform(0.0, 0.25, values, NoiseModel::Constant(0.0)).unwrap();
        let bg = background::preliminary(&signal, &BackgroundOptions::default());
        let derived = initial_guess(&signal, &bg, Polarity::Auto);
        assert_eq!(derived.center, 80.0);

        let opts = LocalizerOptions {
            center_hint: Some(30.1),
            width_hint: Some(2.5),
            offset_hint: Some(1.0),
            ..Default::default()
        };
        let hinted = apply_hints(derived, &signal, &bg, &opts);
        assert_eq!(hinted.center, 30.1);
        assert_eq!(hinted.peak_index, 120);
        assert_eq!(hinted.width, 2.5);
        assert!((hinted.amplitude - 4.0).abs() < 1e-12);
    }

    #[test]
    fn no_hints_keeps_the_derived_guess() {
        let signal = gaussian_signal(4.0, 40.0, 3.0, 1.0);
        let bg = background::preliminary(&signal, &BackgroundOptions::default());
        let derived = initial_guess(&signal, &bg, Polarity::Auto);
        let same = apply_hints(derived, &signal, &bg, &LocalizerOptions::default());
        assert_eq!(same, derived);
    }
}
