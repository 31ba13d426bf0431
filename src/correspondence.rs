//! Voxel to surface correspondence: for every voxel center, the closest fiducial surface
//! vertex and the distance to it.

use log::{debug, info};
use ndarray::Array3;
use ndarray_stats::QuantileExt;

use std::fmt;

use crate::error::{Result, RoiMaskError};
use crate::mesh::BrainMesh;
use crate::surface_index::SurfaceIndex;
use crate::vertex_space::{hemisphere_mask, FullVertex, HemiSplit};
use crate::volume::VolumeGrid;

/// Default cortical distance threshold in mm.
pub const DEFAULT_CORTICAL_DISTANCE: f64 = 2.0;


/// A snapshot of everything the mesh and transform provider hands over for one subject and transform:
/// the merged fiducial mesh (Full vertex space), the target grid and the hemisphere split.
#[derive(Debug, Clone, PartialEq)]
pub struct CorticalSurface {
    pub fiducial: BrainMesh,
    pub grid: VolumeGrid,
    pub hemispheres: HemiSplit,
}


impl CorticalSurface {

    /// Create a surface snapshot. `n_left` is the number of leading vertices of `fiducial` that belong to the left hemisphere.
    pub fn new(fiducial: BrainMesh, grid: VolumeGrid, n_left: usize) -> Result<CorticalSurface> {
        let hemispheres = HemiSplit::new(n_left, fiducial.num_vertices())?;
        Ok(CorticalSurface { fiducial, grid, hemispheres })
    }


    /// Create a surface snapshot from separate hemisphere meshes, which are merged left first.
    pub fn from_hemispheres(lh: &BrainMesh, rh: &BrainMesh, grid: VolumeGrid) -> Result<CorticalSurface> {
        CorticalSurface::new(lh.merge(rh), grid, lh.num_vertices())
    }


    pub fn num_vertices(&self) -> usize {
        self.fiducial.num_vertices()
    }
}


impl fmt::Display for CorticalSurface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Cortical surface with {} vertices ({} left hemisphere) on a {}x{}x{} grid.",
            self.num_vertices(),
            self.hemispheres.n_left(),
            self.grid.shape[0],
            self.grid.shape[1],
            self.grid.shape[2]
        )
    }
}


/// Two parallel volumes on the grid: distance (mm) to the closest vertex and the closest vertex itself.
#[derive(Debug, Clone, PartialEq)]
///
/// Both volumes always have the same shape.
pub struct VertexCorrespondence {
    dist: Array3<f64>,
    nearest_vertex: Array3<FullVertex>,
}


impl VertexCorrespondence {

    /// Assemble a correspondence from existing volumes, e.g. one computed earlier for the same grid.
    pub fn new(dist: Array3<f64>, nearest_vertex: Array3<FullVertex>) -> Result<VertexCorrespondence> {
        if dist.shape() != nearest_vertex.shape() {
            return Err(RoiMaskError::invalid_input(format!(
                "distance volume has shape {:?} but nearest vertex volume has shape {:?}",
                dist.shape(),
                nearest_vertex.shape()
            )));
        }
        Ok(VertexCorrespondence { dist, nearest_vertex })
    }


    /// Distance (mm) from each voxel center to its closest vertex.
    pub fn dist(&self) -> &Array3<f64> {
        &self.dist
    }


    /// Closest Full space vertex of each voxel center.
    pub fn nearest_vertex(&self) -> &Array3<FullVertex> {
        &self.nearest_vertex
    }


    pub fn num_voxels(&self) -> usize {
        self.dist.len()
    }


    /// Smallest and largest voxel to surface distance. `None` if a distance is NaN.
    pub fn distance_range(&self) -> Option<(f64, f64)> {
        let min = self.dist.min().ok()?;
        let max = self.dist.max().ok()?;
        Some((*min, *max))
    }


    /// Voxels closer to the surface than `max_dist` mm.
    pub fn cortical_mask(&self, max_dist: f64) -> Array3<bool> {
        cortical_mask(&self.dist, max_dist)
    }


    /// Left and right hemisphere voxel masks.
    pub fn hemisphere_masks(&self, split: &HemiSplit) -> (Array3<bool>, Array3<bool>) {
        hemisphere_mask(&self.nearest_vertex, split.n_left())
    }


    /// Check that this correspondence matches the given grid shape and vertex count.
    pub(crate) fn check_against(&self, surface: &CorticalSurface) -> Result<()> {
        let expected = surface.grid.shape;
        if self.dist.shape() != &expected[..] {
            return Err(RoiMaskError::invalid_input(format!(
                "correspondence volumes have shape {:?} but the grid has shape {:?}",
                self.dist.shape(),
                expected
            )));
        }
        if let Some(bad) = self.nearest_vertex.iter().find(|v| v.0 >= surface.num_vertices()) {
            return Err(RoiMaskError::invalid_input(format!(
                "correspondence references {} but the surface has {} vertices",
                bad,
                surface.num_vertices()
            )));
        }
        Ok(())
    }
}


/// Check a cortical distance threshold. Fails with [`RoiMaskError::Configuration`] unless it is a
/// finite, non-negative number of mm.
pub(crate) fn check_cortical_distance(max_dist: f64) -> Result<()> {
    if !max_dist.is_finite() || max_dist < 0.0 {
        return Err(RoiMaskError::configuration(format!(
            "cortical distance must be a finite, non-negative number of mm, got {}",
            max_dist
        )));
    }
    Ok(())
}


/// Mask of voxels with a distance strictly below `max_dist`.
pub fn cortical_mask(dist: &Array3<f64>, max_dist: f64) -> Array3<bool> {
    dist.mapv(|d| d < max_dist)
}


/// Compute the closest fiducial vertex and its distance for each voxel of the surface's grid.
///
/// Fails with [`RoiMaskError::SingularTransform`] if the grid transform cannot be inverted and
/// with [`RoiMaskError::InvalidInput`] if the surface has no vertices.
pub fn compute_vertex_correspondence(surface: &CorticalSurface) -> Result<VertexCorrespondence> {
    let index = SurfaceIndex::from_mesh(&surface.fiducial)?;
    correspondence_with_index(&index, &surface.grid)
}


/// Like [`compute_vertex_correspondence`], but reuses an existing surface index.
pub fn correspondence_with_index(index: &SurfaceIndex, grid: &VolumeGrid) -> Result<VertexCorrespondence> {
    let centers = grid.voxel_centers()?;
    info!("Querying nearest surface vertex for {} voxels over {} vertices.", centers.len(), index.num_vertices());

    let found = index.nearest_batch(&centers);
    let (dist, nearest): (Vec<f64>, Vec<FullVertex>) = found.into_iter().map(|nn| (nn.distance, nn.vertex)).unzip();

    let dist = Array3::from_shape_vec(grid.dim(), dist)
        .map_err(|e| RoiMaskError::invalid_input(format!("distance volume: {}", e)))?;
    let nearest_vertex = Array3::from_shape_vec(grid.dim(), nearest)
        .map_err(|e| RoiMaskError::invalid_input(format!("nearest vertex volume: {}", e)))?;

    let corr = VertexCorrespondence { dist, nearest_vertex };
    if let Some((lo, hi)) = corr.distance_range() {
        debug!("Voxel to surface distances range from {:.3} to {:.3} mm.", lo, hi);
    }
    Ok(corr)
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::affine::Affine;
    use approx::assert_abs_diff_eq;

    fn two_vertex_surface() -> CorticalSurface {
        let mesh = BrainMesh::from_points(&[[0.0, 0.0, 0.0], [3.0, 0.0, 0.0]]);
        let grid = VolumeGrid::new([1, 1, 4], Affine::identity()).unwrap();
        CorticalSurface::new(mesh, grid, 1).unwrap()
    }

    #[test]
    fn every_voxel_gets_its_nearest_vertex() {
        let surface = two_vertex_surface();
        let corr = compute_vertex_correspondence(&surface).unwrap();

        assert_eq!((1, 1, 4), corr.dist.dim());
        let nearest: Vec<usize> = corr.nearest_vertex.iter().map(|v| v.0).collect();
        assert_eq!(vec![0, 0, 1, 1], nearest);

        let expected = [0.0, 1.0, 1.0, 0.0];
        for (d, e) in corr.dist.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*d, *e, epsilon = 1e-12);
        }
        assert_eq!(Some((0.0, 1.0)), corr.distance_range());
    }

    #[test]
    fn masks_follow_distance_and_hemisphere() {
        let surface = two_vertex_surface();
        let corr = compute_vertex_correspondence(&surface).unwrap();

        let cx = corr.cortical_mask(1.0);
        assert_eq!(cx.iter().copied().collect::<Vec<bool>>(), vec![true, false, false, true]);

        let (left, right) = corr.hemisphere_masks(&surface.hemispheres);
        assert_eq!(left.iter().copied().collect::<Vec<bool>>(), vec![true, true, false, false]);
        assert_eq!(right.iter().copied().collect::<Vec<bool>>(), vec![false, false, true, true]);
    }

    #[test]
    fn hemisphere_meshes_are_merged_left_first() {
        let lh = BrainMesh::from_points(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let rh = BrainMesh::from_points(&[[5.0, 0.0, 0.0]]);
        let grid = VolumeGrid::new([1, 1, 1], Affine::identity()).unwrap();
        let surface = CorticalSurface::from_hemispheres(&lh, &rh, grid).unwrap();
        assert_eq!(3, surface.num_vertices());
        assert_eq!(2, surface.hemispheres.n_left());
    }

    #[test]
    fn an_empty_surface_is_rejected() {
        let grid = VolumeGrid::new([1, 1, 1], Affine::identity()).unwrap();
        let surface = CorticalSurface::new(BrainMesh::default(), grid, 0).unwrap();
        assert!(matches!(compute_vertex_correspondence(&surface), Err(RoiMaskError::InvalidInput(_))));
    }

    #[test]
    fn mismatched_volumes_are_rejected() {
        let dist = Array3::<f64>::zeros((1, 1, 2));
        let nearest = Array3::from_elem((1, 2, 1), FullVertex(0));
        assert!(VertexCorrespondence::new(dist, nearest).is_err());

        let dist = Array3::<f64>::zeros((1, 1, 1));
        let nearest = Array3::from_elem((1, 1, 2), FullVertex(0));
        assert!(matches!(VertexCorrespondence::new(dist, nearest), Err(RoiMaskError::InvalidInput(_))));
    }

    #[test]
    fn a_correspondence_for_another_grid_is_rejected() {
        let surface = two_vertex_surface();
        let dist = Array3::<f64>::zeros((1, 1, 2));
        let nearest = Array3::from_elem((1, 1, 2), FullVertex(0));
        let corr = VertexCorrespondence::new(dist, nearest).unwrap();
        assert!(matches!(corr.check_against(&surface), Err(RoiMaskError::InvalidInput(_))));

        let dist = Array3::<f64>::zeros((1, 1, 4));
        let nearest = Array3::from_elem((1, 1, 4), FullVertex(2));
        let corr = VertexCorrespondence::new(dist, nearest).unwrap();
        assert!(matches!(corr.check_against(&surface), Err(RoiMaskError::InvalidInput(_))));
    }

    #[test]
    fn invalid_cortical_distances_are_rejected() {
        assert!(check_cortical_distance(0.0).is_ok());
        assert!(check_cortical_distance(2.5).is_ok());
        for bad in [f64::NAN, f64::INFINITY, -1.0].iter() {
            assert!(matches!(check_cortical_distance(*bad), Err(RoiMaskError::Configuration(_))));
        }
    }
}
