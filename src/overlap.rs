//! Resolution of voxels claimed by more than one region.

use log::{info, warn};

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, RoiMaskError};
use crate::rasterize::RegionMembership;
use crate::vertex_space::Hemisphere;

/// How to treat voxels claimed by several regions of the same hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Remove contested voxels from every region.
    Cut,
    /// Keep all claims. No resolution is performed; a single label volume cannot represent the
    /// result, so label encoding refuses it.
    Split,
}

impl Default for OverlapPolicy {
    fn default() -> OverlapPolicy {
        OverlapPolicy::Cut
    }
}

impl FromStr for OverlapPolicy {
    type Err = RoiMaskError;

    fn from_str(s: &str) -> Result<OverlapPolicy> {
        match s.to_ascii_lowercase().as_str() {
            "cut" => Ok(OverlapPolicy::Cut),
            "split" => Ok(OverlapPolicy::Split),
            _ => Err(RoiMaskError::configuration(format!(
                "unknown overlap policy '{}', expected 'cut' or 'split'",
                s
            ))),
        }
    }
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OverlapPolicy::Cut => write!(f, "cut"),
            OverlapPolicy::Split => write!(f, "split"),
        }
    }
}


/// Region membership after overlap resolution, ready for label encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMembership {
    membership: RegionMembership,
    policy: OverlapPolicy,
    cut_per_hemisphere: [usize; 2],
}

impl ResolvedMembership {
    pub fn membership(&self) -> &RegionMembership {
        &self.membership
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Number of (voxel, hemisphere) pairs cleared because several regions claimed them.
    pub fn voxels_cut(&self) -> usize {
        self.cut_per_hemisphere.iter().sum()
    }

    pub fn voxels_cut_in(&self, hemi: Hemisphere) -> usize {
        self.cut_per_hemisphere[hemi.axis_index()]
    }

    pub fn into_membership(self) -> RegionMembership {
        self.membership
    }
}


/// Restrict the cortex region to voxels no other region claims, per hemisphere.
///
/// Does nothing if the cortex is not among the regions.
pub fn subtract_named_regions_from_cortex(membership: &mut RegionMembership) {
    let cortex = match membership.cortex_index() {
        Some(idx) => idx,
        None => return,
    };

    for mut voxel in membership.members.outer_iter_mut() {
        for h in 0..2 {
            let claimed_by_other = voxel
                .column(h)
                .iter()
                .enumerate()
                .any(|(ir, &m)| ir != cortex && m);
            if claimed_by_other {
                voxel[[cortex, h]] = false;
            }
        }
    }
}


/// Resolve overlapping region claims.
///
/// The cortex region is first reduced to the complement of all other regions. Then, with
/// [`OverlapPolicy::Cut`], every voxel claimed by more than one region of a hemisphere is removed
/// from all regions of that hemisphere. [`OverlapPolicy::Split`] leaves the claims untouched.
pub fn resolve_overlaps(mut membership: RegionMembership, policy: OverlapPolicy) -> ResolvedMembership {
    subtract_named_regions_from_cortex(&mut membership);

    let mut cut_per_hemisphere = [0usize; 2];
    match policy {
        OverlapPolicy::Cut => {
            for mut voxel in membership.members.outer_iter_mut() {
                for h in 0..2 {
                    let claims = voxel.column(h).iter().filter(|&&m| m).count();
                    if claims > 1 {
                        voxel.column_mut(h).fill(false);
                        cut_per_hemisphere[h] += 1;
                    }
                }
            }
            info!("{} voxels cut", cut_per_hemisphere[0] + cut_per_hemisphere[1]);
        }
        OverlapPolicy::Split => {
            warn!("The 'split' overlap policy keeps all overlapping region claims unresolved.");
        }
    }

    ResolvedMembership { membership, policy, cut_per_hemisphere }
}
