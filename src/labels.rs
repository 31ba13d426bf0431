//! The signed region label volume and the top level entry points.
//!
//! The label of a voxel is `-k` if it belongs to region `k` (1-based, in region list order) in
//! the left hemisphere, `+k` for the right hemisphere and `0` if it belongs to no region.

use log::{debug, info, warn};
use ndarray::Array3;

use std::collections::BTreeMap;
use std::fmt;

use crate::correspondence::{check_cortical_distance, compute_vertex_correspondence, CorticalSurface, VertexCorrespondence, DEFAULT_CORTICAL_DISTANCE};
use crate::error::{Result, RoiMaskError};
use crate::overlap::{resolve_overlaps, OverlapPolicy, ResolvedMembership};
use crate::rasterize::rasterize_regions;
use crate::traits::RegionSource;
use crate::vertex_space::Hemisphere;


/// Options for [`compute_roi_labels`].
#[derive(Debug, Clone, PartialEq)]
pub struct RoiLabelOptions {
    /// The regions to label, in label order. `None` labels all regions of the provider, in its order.
    pub roi_list: Option<Vec<String>>,
    /// Voxels at this distance (mm) from the surface or further belong to no region.
    pub cortical_distance: f64,
    /// Treatment of voxels claimed by more than one region.
    pub overlap: OverlapPolicy,
}

impl Default for RoiLabelOptions {
    fn default() -> RoiLabelOptions {
        RoiLabelOptions {
            roi_list: None,
            cortical_distance: DEFAULT_CORTICAL_DISTANCE,
            overlap: OverlapPolicy::Cut,
        }
    }
}

impl RoiLabelOptions {

    /// Label only the given regions.
    pub fn with_rois<S: AsRef<str>>(mut self, rois: &[S]) -> RoiLabelOptions {
        self.roi_list = Some(rois.iter().map(|r| r.as_ref().to_string()).collect());
        self
    }

    pub fn with_cortical_distance(mut self, mm: f64) -> RoiLabelOptions {
        self.cortical_distance = mm;
        self
    }

    pub fn with_overlap(mut self, policy: OverlapPolicy) -> RoiLabelOptions {
        self.overlap = policy;
        self
    }


    /// Check option values. Fails with [`RoiMaskError::Configuration`].
    pub fn validate(&self) -> Result<()> {
        check_cortical_distance(self.cortical_distance)
    }


    fn region_list<R: RegionSource>(&self, regions: &R) -> Vec<String> {
        match &self.roi_list {
            Some(list) => list.clone(),
            None => regions.region_names(),
        }
    }
}


/// A signed region label volume plus the region name to label mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiLabels {
    /// Negative labels are left hemisphere, positive right hemisphere, 0 unassigned.
    pub labels: Array3<i64>,
    /// The 1-based label magnitude of each region.
    pub roi_index: BTreeMap<String, i64>,
    /// Number of (voxel, hemisphere) pairs removed from all regions by the overlap policy.
    pub voxels_cut: usize,
}


impl RoiLabels {

    /// The label magnitude of the named region.
    pub fn index_of(&self, name: &str) -> Option<i64> {
        self.roi_index.get(name).copied()
    }


    /// The region name and hemisphere of a label, or `None` for 0 and unknown labels.
    pub fn region_of_label(&self, label: i64) -> Option<(&str, Hemisphere)> {
        if label == 0 {
            return None;
        }
        let hemi = if label < 0 { Hemisphere::Left } else { Hemisphere::Right };
        self.roi_index
            .iter()
            .find(|(_, k)| **k == label.abs())
            .map(|(name, _)| (name.as_str(), hemi))
    }


    /// Mask of the voxels assigned to the named region, in the given hemisphere or, with `None`, in either.
    pub fn region_mask(&self, name: &str, hemi: Option<Hemisphere>) -> Option<Array3<bool>> {
        let k = self.index_of(name)?;
        Some(self.labels.mapv(|l| match hemi {
            Some(h) => l == h.sign() * k,
            None => l.abs() == k,
        }))
    }


    /// Number of voxels carrying a non-zero label.
    pub fn num_labeled_voxels(&self) -> usize {
        self.labels.iter().filter(|&&l| l != 0).count()
    }
}


impl fmt::Display for RoiLabels {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Label volume assigning {} voxels to {} regions ({} cut).",
            self.num_labeled_voxels(),
            self.roi_index.len(),
            self.voxels_cut
        )
    }
}


/// Pack resolved membership into a signed label volume.
///
/// Fails with [`RoiMaskError::Configuration`] for memberships resolved with [`OverlapPolicy::Split`],
/// which may still hold several claims per voxel.
pub fn encode_labels(resolved: &ResolvedMembership) -> Result<RoiLabels> {
    if resolved.policy() == OverlapPolicy::Split {
        return Err(RoiMaskError::configuration(
            "the 'split' overlap policy leaves overlapping claims that a label volume cannot represent",
        ));
    }

    let membership = resolved.membership();
    let mut flat = vec![0i64; membership.num_voxels()];
    let mut roi_index = BTreeMap::new();

    for (ir, name) in membership.names().iter().enumerate() {
        let k = ir as i64 + 1;
        let left = membership.region_hemisphere(ir, Hemisphere::Left);
        let right = membership.region_hemisphere(ir, Hemisphere::Right);
        for (v, (&l, &r)) in left.iter().zip(right.iter()).enumerate() {
            debug_assert!(!(l && r), "voxel {} is in both hemispheres of region '{}'", v, name);
            if l {
                flat[v] = -k;
            }
            if r {
                flat[v] = k;
            }
        }
        roi_index.insert(name.clone(), k);
    }

    let [d0, d1, d2] = membership.shape();
    let labels = Array3::from_shape_vec((d0, d1, d2), flat)
        .map_err(|e| RoiMaskError::invalid_input(format!("label volume: {}", e)))?;

    Ok(RoiLabels { labels, roi_index, voxels_cut: resolved.voxels_cut() })
}


/// Compute the signed region label volume of `regions` on the grid of `surface`.
///
/// # Examples
///
/// ```
/// use roimask::{compute_roi_labels, Affine, BrainMesh, CorticalSurface, RegionSet, RoiLabelOptions, ValidVertex, ValidVertexMap, VolumeGrid};
///
/// // two vertices per hemisphere, a single voxel at the origin
/// let mesh = BrainMesh::from_points(&[[0.0, 0.0, 0.0], [5.0, 0.0, 0.0], [20.0, 0.0, 0.0], [25.0, 0.0, 0.0]]);
/// let grid = VolumeGrid::new([1, 1, 1], Affine::identity()).unwrap();
/// let surface = CorticalSurface::new(mesh, grid, 2).unwrap();
///
/// let mut regions = RegionSet::new(ValidVertexMap::identity(4));
/// regions.add_region("A", &[ValidVertex(0)]).unwrap();
///
/// let labels = compute_roi_labels(&surface, &regions, &RoiLabelOptions::default()).unwrap();
/// assert_eq!(-1, labels.labels[[0, 0, 0]]);
/// assert_eq!(Some(1), labels.index_of("A"));
/// ```
pub fn compute_roi_labels<R>(surface: &CorticalSurface, regions: &R, options: &RoiLabelOptions) -> Result<RoiLabels>
where
    R: RegionSource + Sync,
{
    check_label_options(options)?;
    let corr = compute_vertex_correspondence(surface)?;
    roi_labels_from_correspondence(surface, &corr, regions, options)
}


/// Like [`compute_roi_labels`], but reuses a correspondence computed earlier for the same surface and grid.
pub fn roi_labels_from_correspondence<R>(
    surface: &CorticalSurface,
    corr: &VertexCorrespondence,
    regions: &R,
    options: &RoiLabelOptions,
) -> Result<RoiLabels>
where
    R: RegionSource + Sync,
{
    check_label_options(options)?;
    corr.check_against(surface)?;

    let names = options.region_list(regions);
    info!(
        "Labeling {} regions on {} voxels, cortical distance {} mm, overlap policy '{}'.",
        names.len(),
        corr.num_voxels(),
        options.cortical_distance,
        options.overlap
    );

    let membership = rasterize_regions(regions, &names, corr, &surface.hemispheres, options.cortical_distance)?;
    let resolved = resolve_overlaps(membership, options.overlap);
    let labels = encode_labels(&resolved)?;
    debug!("{}", labels);
    Ok(labels)
}


/// Per region voxel masks (either hemisphere), restricted to the cortical distance but without
/// any overlap resolution. Regions may share voxels.
pub fn roi_voxel_masks<R>(
    surface: &CorticalSurface,
    regions: &R,
    names: &[String],
    cortical_distance: f64,
) -> Result<BTreeMap<String, Array3<bool>>>
where
    R: RegionSource + Sync,
{
    check_cortical_distance(cortical_distance)?;
    let corr = compute_vertex_correspondence(surface)?;
    let membership = rasterize_regions(regions, names, &corr, &surface.hemispheres, cortical_distance)?;

    let mut masks = BTreeMap::new();
    for (ir, name) in membership.names().iter().enumerate() {
        let vol = membership.region_volume(ir)?;
        if !vol.iter().any(|&m| m) {
            warn!("Region '{}' covers no voxels.", name);
        }
        masks.insert(name.clone(), vol);
    }
    Ok(masks)
}


fn check_label_options(options: &RoiLabelOptions) -> Result<()> {
    options.validate()?;
    if options.overlap == OverlapPolicy::Split {
        return Err(RoiMaskError::configuration(
            "the 'split' overlap policy cannot be encoded in a label volume, use 'cut'",
        ));
    }
    Ok(())
}
