//! Per-element layout of the blob: rest positions inside a ball and the
//! random seeds the shader uses for noise phase, jitter and sizing.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

pub struct ShapeElements {
    pub positions: Vec<Vec3>,
    pub seeds: Vec<[f32; 3]>,
}

impl ShapeElements {
    /// `count` elements uniformly distributed in a ball of `radius`.
    ///
    /// The same seed always yields the same layout.
    pub fn generate(count: usize, radius: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions = Vec::with_capacity(count);
        let mut seeds = Vec::with_capacity(count);
        for _ in 0..count {
            let theta = rng.gen::<f32>() * TAU;
            let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
            let r = radius * rng.gen::<f32>().cbrt();
            positions.push(Vec3::new(
                r * phi.sin() * theta.cos(),
                r * phi.sin() * theta.sin(),
                r * phi.cos(),
            ));
            seeds.push([rng.gen(), rng.gen(), rng.gen()]);
        }
        Self { positions, seeds }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
