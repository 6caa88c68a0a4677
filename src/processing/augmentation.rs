//! Coordinate augmentation
//!
//! Transforms applied to residue coordinates after extraction and before
//! edge displacements are derived. Transforms hold no state of their own; all
//! randomness comes from the generator passed in, so a seeded `StdRng`
//! reproduces the same augmentation.

use crate::geometry::{apply_rotation, orthogonalize, transpose};
use rand::rngs::StdRng;
use rand::Rng;
use std::fmt::Debug;

/// Replaceable coordinate transform
pub trait CoordinateTransform: Debug + Send + Sync {
    /// Transform `(N, 3)` coordinates in place
    fn apply(&self, coords: &mut [[f32; 3]], rng: &mut StdRng);
}

/// Leaves coordinates untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl CoordinateTransform for Identity {
    fn apply(&self, _coords: &mut [[f32; 3]], _rng: &mut StdRng) {}
}

/// Uniformly distributed random 3D rotation about the origin
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRotation;

impl RandomRotation {
    /// Draw a rotation matrix by orthogonalizing a Gaussian 3x3 matrix
    pub fn sample_matrix(rng: &mut StdRng) -> [[f32; 3]; 3] {
        loop {
            let mut m = [[0.0f32; 3]; 3];
            for row in m.iter_mut() {
                for v in row.iter_mut() {
                    *v = standard_normal(rng);
                }
            }
            // Singular draws have probability zero; redraw if one shows up
            if let Some(q) = orthogonalize(&m) {
                return q;
            }
        }
    }
}

impl CoordinateTransform for RandomRotation {
    fn apply(&self, coords: &mut [[f32; 3]], rng: &mut StdRng) {
        let q = Self::sample_matrix(rng);
        // Row vectors times Q
        apply_rotation(coords, &transpose(&q));
    }
}

/// Box-Muller transform for Gaussian samples
fn standard_normal(rng: &mut StdRng) -> f32 {
    // gen() is in [0, 1); shift to (0, 1] so ln() stays finite
    let u1: f32 = 1.0 - rng.gen::<f32>();
    let u2: f32 = rng.gen();
    (-2.0_f32 * u1.ln()).sqrt() * (2.0_f32 * std::f32::consts::PI * u2).cos()
}
