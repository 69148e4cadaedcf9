//! Seamless 2D noise over a toroidal world. World coordinates are mapped
//! onto two circles (one per axis) living in 4D space, so the noise field
//! wraps bit-for-bit at the world edges instead of being mirrored or
//! blended there.

use crate::{
    noise::Simplex4d,
    rng::{combine_seed, hash_string},
};
use std::f64::consts::TAU;

/// A seeded noise layer over a `width_m x height_m` torus, with fractal
/// helpers. Derive independent layers per role with [Self::derive] rather
/// than reusing one layer at different frequencies.
#[derive(Clone, Debug)]
pub struct TorusNoise {
    seed: u32,
    width_m: f64,
    height_m: f64,
    simplex: Simplex4d,
}

impl TorusNoise {
    pub fn new(seed: u32, width_m: f64, height_m: f64) -> Self {
        Self {
            seed,
            width_m,
            height_m,
            simplex: Simplex4d::new(seed),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Clone this layer's world geometry with a new seed derived from a
    /// label, carving an independent noise field for a different role.
    pub fn derive(&self, label: &str) -> TorusNoise {
        TorusNoise::new(
            combine_seed(self.seed, hash_string(label)),
            self.width_m,
            self.height_m,
        )
    }

    /// Sample a single octave at world meters `(x, y)`. `frequency` is in
    /// cycles per meter; the circle radius scales with it so features keep a
    /// sensible aspect ratio at any frequency.
    pub fn sample(&self, x: f64, y: f64, frequency: f64) -> f64 {
        let angle_x = TAU * x / self.width_m;
        let angle_y = TAU * y / self.height_m;
        let radius = frequency * self.width_m / TAU;
        self.simplex.sample(
            radius * angle_x.cos(),
            radius * angle_x.sin(),
            radius * angle_y.cos(),
            radius * angle_y.sin(),
        )
    }

    /// Fractal Brownian motion with the default lacunarity (2) and
    /// persistence (0.5).
    pub fn fbm(&self, x: f64, y: f64, frequency: f64, octaves: u32) -> f64 {
        self.fbm_with(x, y, frequency, octaves, 2.0, 0.5)
    }

    /// Fractal Brownian motion: sum `octaves` samples, each at `lacunarity`
    /// times the previous frequency and `persistence` times the previous
    /// amplitude, normalized so the output stays in roughly `[-1, 1]`.
    ///
    /// The octave loop runs low frequency to high and must stay that way;
    /// the summation order is part of the reproducibility contract.
    pub fn fbm_with(
        &self,
        x: f64,
        y: f64,
        frequency: f64,
        octaves: u32,
        lacunarity: f64,
        persistence: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut freq = frequency;
        let mut amplitude_sum = 0.0;
        for _ in 0..octaves {
            total += amplitude * self.sample(x, y, freq);
            amplitude_sum += amplitude;
            amplitude *= persistence;
            freq *= lacunarity;
        }
        if amplitude_sum > 0.0 {
            total / amplitude_sum
        } else {
            0.0
        }
    }

    /// Ridged multifractal: each octave sample `s` becomes `(1 - |s|)^2`,
    /// which turns the noise field's zero crossings into sharp crests. Used
    /// for mountain belts.
    pub fn ridged(&self, x: f64, y: f64, frequency: f64, octaves: u32) -> f64 {
        self.ridged_with(x, y, frequency, octaves, 2.0, 0.5)
    }

    pub fn ridged_with(
        &self,
        x: f64,
        y: f64,
        frequency: f64,
        octaves: u32,
        lacunarity: f64,
        persistence: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut freq = frequency;
        let mut amplitude_sum = 0.0;
        for _ in 0..octaves {
            let s = self.sample(x, y, freq);
            let ridge = (1.0 - s.abs()) * (1.0 - s.abs());
            total += amplitude * ridge;
            amplitude_sum += amplitude;
            amplitude *= persistence;
            freq *= lacunarity;
        }
        if amplitude_sum > 0.0 {
            total / amplitude_sum
        } else {
            0.0
        }
    }
}
