//! The 4x4 affine transform between world space (mm) and voxel grid coordinates.

use approx::abs_diff_eq;
use nalgebra::{Matrix4, Vector4};

use std::fmt;

use crate::error::{Result, RoiMaskError};

/// Tolerance used when checking that the bottom row of a matrix is `0 0 0 1`.
pub const AFFINE_ROW_EPSILON: f64 = 1e-9;

/// A homogeneous 4x4 affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    matrix: Matrix4<f64>,
}

impl Affine {

    /// The identity transform, voxel coordinates equal world coordinates.
    pub fn identity() -> Affine {
        Affine { matrix: Matrix4::identity() }
    }


    /// Build an affine from its 4 rows.
    ///
    /// All entries must be finite and the bottom row must be `0 0 0 1`, otherwise an
    /// [`RoiMaskError::InvalidInput`] is returned. Invertibility is not checked here, see [`Affine::inverse`].
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Result<Affine> {
        let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        if flat.iter().any(|v| !v.is_finite()) {
            return Err(RoiMaskError::invalid_input("affine contains non-finite entries"));
        }

        let bottom = rows[3];
        let expected = [0.0, 0.0, 0.0, 1.0];
        let is_affine = bottom
            .iter()
            .zip(expected.iter())
            .all(|(a, b)| abs_diff_eq!(*a, *b, epsilon = AFFINE_ROW_EPSILON));
        if !is_affine {
            return Err(RoiMaskError::invalid_input(format!(
                "bottom row of affine must be [0, 0, 0, 1], got {:?}",
                bottom
            )));
        }

        Ok(Affine { matrix: Matrix4::from_row_slice(&flat) })
    }


    /// A pure scaling plus translation, handy for isotropic voxel grids.
    ///
    /// # Examples
    ///
    /// ```
    /// // 2mm voxels, world origin at voxel (10, 10, 10)
    /// let xfm = roimask::Affine::scale_translate([0.5, 0.5, 0.5], [10.0, 10.0, 10.0]).unwrap();
    /// assert_eq!(xfm.apply([0.0, 0.0, 0.0]), [10.0, 10.0, 10.0]);
    /// ```
    pub fn scale_translate(scale: [f64; 3], translation: [f64; 3]) -> Result<Affine> {
        Affine::from_rows([
            [scale[0], 0.0, 0.0, translation[0]],
            [0.0, scale[1], 0.0, translation[1]],
            [0.0, 0.0, scale[2], translation[2]],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }


    /// Invert the transform.
    ///
    /// Fails with [`RoiMaskError::SingularTransform`] if the matrix has no inverse.
    pub fn inverse(&self) -> Result<Affine> {
        let inv = self.matrix.try_inverse().ok_or(RoiMaskError::SingularTransform)?;
        // Near-singular input can produce an "inverse" full of inf/NaN.
        if inv.iter().any(|v| !v.is_finite()) {
            return Err(RoiMaskError::SingularTransform);
        }
        Ok(Affine { matrix: inv })
    }


    /// Apply the transform to the homogeneous point `(p, 1)` and drop the fourth component.
    pub fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        let out = self.matrix * Vector4::new(p[0], p[1], p[2], 1.0);
        [out[0], out[1], out[2]]
    }


    /// The underlying matrix.
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }
}

impl Default for Affine {
    fn default() -> Affine {
        Affine::identity()
    }
}

impl fmt::Display for Affine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Affine transform {}", self.matrix)
    }
}
