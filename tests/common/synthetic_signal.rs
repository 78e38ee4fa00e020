//! Synthetic pulses on a uniform grid with a known area.

use pulse_integrator::{NoiseModel, Signal};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

#[derive(Clone, Copy, Debug)]
pub struct Grid {
    pub x0: f64,
    pub dx: f64,
    pub n: usize,
}

/// 400 samples over `[0, 100)`.
pub const GRID: Grid = Grid {
    x0: 0.0,
    dx: 0.25,
    n: 400,
};

impl Grid {
    pub fn x(&self, i: usize) -> f64 {
        self.x0 + i as f64 * self.dx
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Shape {
    Gaussian { sigma: f64 },
    /// Symmetric triangle reaching zero at `center ± half_base`.
    Triangle { half_base: f64 },
}

#[derive(Clone, Copy, Debug)]
pub struct Pulse {
    pub shape: Shape,
    pub amplitude: f64,
    pub center: f64,
    pub offset: f64,
    pub slope: f64,
}

impl Pulse {
    pub fn gaussian(amplitude: f64, center: f64, sigma: f64, offset: f64) -> Self {
        Self {
            shape: Shape::Gaussian { sigma },
            amplitude,
            center,
            offset,
            slope: 0.0,
        }
    }

    pub fn triangle(amplitude: f64, center: f64, half_base: f64, offset: f64) -> Self {
        Self {
            shape: Shape::Triangle { half_base },
            amplitude,
            center,
            offset,
            slope: 0.0,
        }
    }

    pub fn with_slope(mut self, slope: f64) -> Self {
        self.slope = slope;
        self
    }

    /// Noise-free value including the baseline.
    pub fn value(&self, x: f64) -> f64 {
        let d = x - self.center;
        let feature = match self.shape {
            Shape::Gaussian { sigma } => (-d * d / (2.0 * sigma * sigma)).exp(),
            Shape::Triangle { half_base } => (1.0 - d.abs() / half_base).max(0.0),
        };
        self.offset + self.slope * x + self.amplitude * feature
    }

    /// Area of the feature over the whole real line.
    pub fn area(&self) -> f64 {
        match self.shape {
            Shape::Gaussian { sigma } => {
                self.amplitude * sigma * (2.0 * std::f64::consts::PI).sqrt()
            }
            Shape::Triangle { half_base } => self.amplitude * half_base,
        }
    }
}

pub fn clean_values(grid: Grid, pulse: &Pulse) -> Vec<f64> {
    (0..grid.n).map(|i| pulse.value(grid.x(i))).collect()
}

/// `clean + sigma·z` with `z` drawn from a seeded standard normal.
pub fn noisy_values(grid: Grid, pulse: &Pulse, sigma: f64, rng: &mut StdRng) -> Vec<f64> {
    (0..grid.n)
        .map(|i| {
            let z: f64 = rng.sample(StandardNormal);
            pulse.value(grid.x(i)) + sigma * z
        })
        .collect()
}

pub fn clean_signal(grid: Grid, pulse: &Pulse) -> Signal {
    Signal::uniform(
        grid.x0,
        grid.dx,
        clean_values(grid, pulse),
        NoiseModel::Constant(0.0),
    )
    .expect("clean signal is valid")
}

pub fn noisy_signal(grid: Grid, pulse: &Pulse, sigma: f64, noise: NoiseModel, seed: u64) -> Signal {
    let mut rng = StdRng::seed_from_u64(seed);
    let values = noisy_values(grid, pulse, sigma, &mut rng);
    Signal::uniform(grid.x0, grid.dx, values, noise).expect("noisy signal is valid")
}

/// Independent realisations sharing one generator.
pub fn noisy_batch(
    grid: Grid,
    pulse: &Pulse,
    sigma: f64,
    noise: NoiseModel,
    seed: u64,
    trials: usize,
) -> Vec<Signal> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..trials)
        .map(|_| {
            let values = noisy_values(grid, pulse, sigma, &mut rng);
            Signal::uniform(grid.x0, grid.dx, values, noise.clone()).expect("noisy signal is valid")
        })
        .collect()
}

/// Fraction of `pulls` with `|pull| <= n`.
pub fn coverage(pulls: &[f64], n: f64) -> f64 {
    pulls.iter().filter(|p| p.abs() <= n).count() as f64 / pulls.len() as f64
}

pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}
