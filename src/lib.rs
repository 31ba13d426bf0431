//! Mapping of cortical surface regions onto a voxel grid.
//!
//! Regions are defined as vertex sets on a flattened cortical surface. This crate finds, for every
//! voxel of a functional volume, the closest vertex of the fiducial surface and uses that
//! correspondence to turn the regions into a signed per-voxel label volume: negative labels for the
//! left hemisphere, positive labels for the right one.

pub mod affine;
pub mod correspondence;
pub mod error;
pub mod labels;
pub mod mesh;
pub mod overlap;
pub mod rasterize;
pub mod regions;
pub mod surface_index;
pub mod traits;
pub mod util;
pub mod vertex_space;
pub mod volume;

pub use affine::Affine;
pub use correspondence::{compute_vertex_correspondence, cortical_mask, correspondence_with_index, CorticalSurface, VertexCorrespondence, DEFAULT_CORTICAL_DISTANCE};
pub use error::{Result, RoiMaskError};
pub use labels::{compute_roi_labels, encode_labels, roi_labels_from_correspondence, roi_voxel_masks, RoiLabelOptions, RoiLabels};
pub use mesh::BrainMesh;
pub use overlap::{resolve_overlaps, subtract_named_regions_from_cortex, OverlapPolicy, ResolvedMembership};
pub use rasterize::{is_cortex, rasterize_regions, validate_region_list, RegionMembership, CORTEX};
pub use regions::RegionSet;
pub use surface_index::{NearestVertex, SurfaceIndex};
pub use traits::RegionSource;
pub use util::{unmask, unmask_frames};
pub use vertex_space::{hemisphere_mask, voxel_membership_from_full, FullVertex, HemiSplit, Hemisphere, ValidVertex, ValidVertexMap};
pub use volume::VolumeGrid;
