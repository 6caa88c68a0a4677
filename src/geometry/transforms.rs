//! Coordinate transformations and geometric utilities
//!
//! Provides functions for:
//! - Rotation of coordinates
//! - Centroids (residue representative positions)
//! - Orthogonalizing a square matrix into a proper rotation

use nalgebra::Matrix3;

/// Apply a 3x3 rotation matrix to coordinates
///
/// Rotates all coordinates in-place (`x' = R x`).
pub fn apply_rotation(coords: &mut [[f32; 3]], rotation: &[[f32; 3]; 3]) {
    for coord in coords.iter_mut() {
        let x = coord[0];
        let y = coord[1];
        let z = coord[2];

        coord[0] = rotation[0][0] * x + rotation[0][1] * y + rotation[0][2] * z;
        coord[1] = rotation[1][0] * x + rotation[1][1] * y + rotation[1][2] * z;
        coord[2] = rotation[2][0] * x + rotation[2][1] * y + rotation[2][2] * z;
    }
}

/// Compute the centroid (unweighted mean position) of coordinates
///
/// Accumulates in f64 so that residues far from the origin keep precision.
pub fn compute_centroid<'a, I>(coords: I) -> Option<[f32; 3]>
where
    I: IntoIterator<Item = &'a [f32; 3]>,
{
    let mut sum = [0.0f64; 3];
    let mut n = 0usize;

    for coord in coords {
        sum[0] += coord[0] as f64;
        sum[1] += coord[1] as f64;
        sum[2] += coord[2] as f64;
        n += 1;
    }

    if n == 0 {
        return None;
    }

    let n = n as f64;
    Some([
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
    ])
}

/// Orthogonalize a square matrix into a proper rotation via QR.
///
/// The Q factor is sign-corrected with the diagonal of R so that a Gaussian
/// input yields a Haar-distributed orthogonal matrix; a reflection is then
/// turned into a rotation by flipping the last column. Returns `None` for a
/// (numerically) singular input.
pub fn orthogonalize(matrix: &[[f32; 3]; 3]) -> Option<[[f32; 3]; 3]> {
    let m = Matrix3::from_fn(|i, j| matrix[i][j] as f64);
    if m.determinant().abs() < 1e-12 {
        return None;
    }

    let qr = m.qr();
    let mut q = qr.q();
    let r = qr.r();

    for k in 0..3 {
        if r[(k, k)] < 0.0 {
            q.column_mut(k).neg_mut();
        }
    }
    if q.determinant() < 0.0 {
        q.column_mut(2).neg_mut();
    }

    let mut out = [[0.0f32; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = q[(i, j)] as f32;
        }
    }
    Some(out)
}

/// Transpose of a 3x3 matrix
pub fn transpose(m: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let mut t = [[0.0f32; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            t[i][j] = m[j][i];
        }
    }
    t
}

/// Determinant of a 3x3 matrix
pub fn determinant(m: &[[f32; 3]; 3]) -> f32 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}
