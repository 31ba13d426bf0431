//! Rasterization of surface regions onto the voxel grid.
//!
//! Every region's Valid space vertex set is carried into Full space, then onto the voxels whose
//! nearest vertex is a member. The result is restricted to voxels near the cortex and split by
//! hemisphere, giving one boolean per voxel, region and hemisphere.

use log::{debug, warn};
use ndarray::{s, Array1, Array3, ArrayView1};
use rayon::prelude::*;

use std::collections::HashSet;

use crate::correspondence::{check_cortical_distance, cortical_mask, VertexCorrespondence};
use crate::error::{Result, RoiMaskError};
use crate::traits::RegionSource;
use crate::vertex_space::{hemisphere_mask, voxel_membership_from_full, HemiSplit, Hemisphere};

/// The reserved region name covering all valid vertices. Matched case-insensitively.
pub const CORTEX: &str = "cortex";

/// Whether `name` is the reserved catch-all cortex region.
pub fn is_cortex(name: &str) -> bool {
    name.eq_ignore_ascii_case(CORTEX)
}


/// Per voxel, per region, per hemisphere membership before overlap resolution.
///
/// The membership array has shape `(num_voxels, num_regions, 2)`; voxels are in row-major
/// order of the volume shape, the last axis is indexed by [`Hemisphere::axis_index`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMembership {
    pub(crate) names: Vec<String>,
    pub(crate) shape: [usize; 3],
    pub(crate) members: Array3<bool>,
}


impl RegionMembership {

    /// The region names, in rasterization order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn num_regions(&self) -> usize {
        self.names.len()
    }

    pub fn num_voxels(&self) -> usize {
        self.members.shape()[0]
    }

    /// The shape of the volume the voxels belong to.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Position of the cortex region in the region list, if it is part of it.
    pub fn cortex_index(&self) -> Option<usize> {
        self.names.iter().position(|n| is_cortex(n))
    }

    /// Whether `voxel` (flat index) belongs to region `region` in `hemi`.
    pub fn is_member(&self, voxel: usize, region: usize, hemi: Hemisphere) -> bool {
        self.members[[voxel, region, hemi.axis_index()]]
    }

    /// The flat voxel membership of one region in one hemisphere.
    pub fn region_hemisphere(&self, region: usize, hemi: Hemisphere) -> ArrayView1<bool> {
        self.members.slice(s![.., region, hemi.axis_index()])
    }

    /// The membership of one region in either hemisphere as a volume.
    pub fn region_volume(&self, region: usize) -> Result<Array3<bool>> {
        let left = self.region_hemisphere(region, Hemisphere::Left);
        let right = self.region_hemisphere(region, Hemisphere::Right);
        let both: Vec<bool> = left.iter().zip(right.iter()).map(|(l, r)| *l || *r).collect();
        Array3::from_shape_vec((self.shape[0], self.shape[1], self.shape[2]), both)
            .map_err(|e| RoiMaskError::invalid_input(format!("region volume: {}", e)))
    }

    /// The raw membership array of shape `(num_voxels, num_regions, 2)`.
    pub fn as_array(&self) -> &Array3<bool> {
        &self.members
    }
}


/// Check a list of region names: no duplicates and at most one spelling of the cortex region.
pub fn validate_region_list(names: &[String]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(RoiMaskError::invalid_input(format!("region '{}' is listed twice", name)));
        }
    }
    if names.iter().filter(|n| is_cortex(n)).count() > 1 {
        return Err(RoiMaskError::invalid_input("the cortex region is listed more than once"));
    }
    Ok(())
}


/// Rasterize the named regions onto the voxel grid of `corr`.
///
/// Voxels with a distance of `max_dist` mm or more to the surface belong to no region. The cortex
/// region claims every remaining voxel here; it is reduced to the complement of the other regions
/// during overlap resolution. Regions are processed in parallel, the output keeps the order of `names`.
///
/// Fails with [`RoiMaskError::Configuration`] if `max_dist` is negative or not finite.
pub fn rasterize_regions<R>(
    regions: &R,
    names: &[String],
    corr: &VertexCorrespondence,
    split: &HemiSplit,
    max_dist: f64,
) -> Result<RegionMembership>
where
    R: RegionSource + Sync,
{
    check_cortical_distance(max_dist)?;
    validate_region_list(names)?;

    let vertex_map = regions.vertex_map();
    if vertex_map.num_full() != split.n_full() {
        return Err(RoiMaskError::invalid_input(format!(
            "regions refer to {} full vertices but the surface has {}",
            vertex_map.num_full(),
            split.n_full()
        )));
    }

    let nearest = corr.nearest_vertex();
    let (left, right) = hemisphere_mask(nearest, split.n_left());
    let near_cortex = cortical_mask(corr.dist(), max_dist);

    let raw: Vec<Array3<bool>> = names
        .par_iter()
        .map(|name| {
            if is_cortex(name) {
                return Ok(Array3::from_elem(nearest.dim(), true));
            }
            let valid_ids = regions.region_vertices(name)?;
            if valid_ids.is_empty() {
                warn!("Region '{}' has no member vertices.", name);
            }
            let valid_mask = vertex_map.valid_mask(&valid_ids)?;
            let full_mask = vertex_map.full_membership_from_valid(&valid_mask)?;
            voxel_membership_from_full(&full_mask, nearest)
        })
        .collect::<Result<Vec<_>>>()?;

    let num_voxels = corr.num_voxels();
    let mut members = Array3::from_elem((num_voxels, names.len(), 2), false);
    for (ir, region) in raw.iter().enumerate() {
        let lh: Array1<bool> = region
            .iter()
            .zip(left.iter())
            .zip(near_cortex.iter())
            .map(|((&m, &l), &c)| m && l && c)
            .collect();
        let rh: Array1<bool> = region
            .iter()
            .zip(right.iter())
            .zip(near_cortex.iter())
            .map(|((&m, &r), &c)| m && r && c)
            .collect();

        debug!(
            "Region '{}' covers {} left and {} right hemisphere voxels.",
            names[ir],
            lh.iter().filter(|&&m| m).count(),
            rh.iter().filter(|&&m| m).count()
        );

        members.slice_mut(s![.., ir, Hemisphere::Left.axis_index()]).assign(&lh);
        members.slice_mut(s![.., ir, Hemisphere::Right.axis_index()]).assign(&rh);
    }

    let (d0, d1, d2) = corr.dist().dim();
    Ok(RegionMembership {
        names: names.to_vec(),
        shape: [d0, d1, d2],
        members,
    })
}
