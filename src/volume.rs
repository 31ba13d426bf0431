//! The voxel grid onto which surface regions are mapped.

use std::fmt;

use crate::affine::Affine;
use crate::error::{Result, RoiMaskError};

/// Models the target voxel grid: its shape and the transform from world space (mm) to voxel coordinates.
///
/// The shape is given in array order, slowest varying axis first, as in a volume loaded
/// from a (z, y, x) ordered functional image. The grid coordinate of the voxel at array index
/// `(i, j, k)` is the reversed tuple `(k, j, i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeGrid {
    pub shape: [usize; 3],
    pub xfm: Affine,
}


impl VolumeGrid {

    pub fn new(shape: [usize; 3], xfm: Affine) -> Result<VolumeGrid> {
        if shape.iter().any(|&d| d == 0) {
            return Err(RoiMaskError::invalid_input(format!("volume shape {:?} has an empty axis", shape)));
        }
        Ok(VolumeGrid { shape, xfm })
    }


    /// Total number of voxels.
    pub fn num_voxels(&self) -> usize {
        self.shape.iter().product()
    }


    /// The shape as an ndarray shape tuple.
    pub fn dim(&self) -> (usize, usize, usize) {
        (self.shape[0], self.shape[1], self.shape[2])
    }


    /// World space centers (mm) of all voxels, in row-major order of the array index.
    ///
    /// Fails with [`RoiMaskError::SingularTransform`] if `xfm` has no inverse.
    pub fn voxel_centers(&self) -> Result<Vec<[f64; 3]>> {
        let vox2world = self.xfm.inverse()?;
        let [ni, nj, nk] = self.shape;
        let mut centers = Vec::with_capacity(self.num_voxels());
        for i in 0..ni {
            for j in 0..nj {
                for k in 0..nk {
                    centers.push(vox2world.apply([k as f64, j as f64, i as f64]));
                }
            }
        }
        Ok(centers)
    }
}


impl fmt::Display for VolumeGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Volume grid of shape {}x{}x{} ({} voxels).", self.shape[0], self.shape[1], self.shape[2], self.num_voxels())
    }
}
