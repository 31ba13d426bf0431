//! Vertex index spaces and the translations between them.
//!
//! A cortical surface is indexed in three nested spaces:
//!
//! * *Full*: all fiducial mesh vertices, left hemisphere first, then right hemisphere.
//! * *Valid*: the subset of Full present in the flattened surface (medial wall vertices removed).
//! * *Hemisphere*: the contiguous sub-ranges `[0, n_left)` and `[n_left, n_full)` of Full.
//!
//! Ids of the first two spaces are distinct types, [`FullVertex`] and [`ValidVertex`], so that
//! an id from one space cannot be used to index an array of the other. The [`ValidVertexMap`]
//! holds the Valid to Full injection and performs all translations between them.

use ndarray::{Array1, Array3};

use std::fmt;

use crate::error::{Result, RoiMaskError};

/// A vertex id in the Full (fiducial, both hemispheres) index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FullVertex(pub usize);

/// A vertex id in the Valid (flattened, medial wall removed) index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ValidVertex(pub usize);

impl FullVertex {
    pub fn index(self) -> usize {
        self.0
    }
}

impl ValidVertex {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FullVertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "full vertex {}", self.0)
    }
}

impl fmt::Display for ValidVertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "valid vertex {}", self.0)
    }
}


/// A brain hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    Left,
    Right,
}

impl Hemisphere {
    /// Both hemispheres, in the order used for the last axis of membership arrays.
    pub const BOTH: [Hemisphere; 2] = [Hemisphere::Left, Hemisphere::Right];

    /// Position of this hemisphere on the hemisphere axis of membership arrays.
    pub fn axis_index(self) -> usize {
        match self {
            Hemisphere::Left => 0,
            Hemisphere::Right => 1,
        }
    }

    /// The label sign used for this hemisphere: negative for left, positive for right.
    pub fn sign(self) -> i64 {
        match self {
            Hemisphere::Left => -1,
            Hemisphere::Right => 1,
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Hemisphere::Left => write!(f, "lh"),
            Hemisphere::Right => write!(f, "rh"),
        }
    }
}


/// Split of the Full index space into hemispheres: left occupies `[0, n_left)`, right `[n_left, n_full)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HemiSplit {
    n_left: usize,
    n_full: usize,
}

impl HemiSplit {
    pub fn new(n_left: usize, n_full: usize) -> Result<HemiSplit> {
        if n_left > n_full {
            return Err(RoiMaskError::invalid_input(format!(
                "left hemisphere vertex count {} exceeds total vertex count {}",
                n_left, n_full
            )));
        }
        Ok(HemiSplit { n_left, n_full })
    }

    pub fn n_left(&self) -> usize {
        self.n_left
    }

    pub fn n_full(&self) -> usize {
        self.n_full
    }

    /// The hemisphere a Full space vertex belongs to.
    pub fn hemisphere_of(&self, v: FullVertex) -> Hemisphere {
        if v.0 < self.n_left {
            Hemisphere::Left
        } else {
            Hemisphere::Right
        }
    }
}


/// Left and right hemisphere masks over a nearest vertex volume.
///
/// A voxel is left iff its nearest vertex id is below `n_left`; the right mask is the complement.
pub fn hemisphere_mask(nearest: &Array3<FullVertex>, n_left: usize) -> (Array3<bool>, Array3<bool>) {
    let left = nearest.mapv(|v| v.0 < n_left);
    let right = left.mapv(|l| !l);
    (left, right)
}


/// The injective, order preserving mapping of Valid vertex ids into Full space (`vertIdx`).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidVertexMap {
    full_of_valid: Vec<FullVertex>,
    n_full: usize,
}

impl ValidVertexMap {

    /// Build the map from the Full id of each Valid vertex, in Valid order.
    ///
    /// The ids must be strictly increasing and below `n_full`.
    pub fn new(full_of_valid: Vec<FullVertex>, n_full: usize) -> Result<ValidVertexMap> {
        for (idx, pair) in full_of_valid.windows(2).enumerate() {
            if pair[0] >= pair[1] {
                return Err(RoiMaskError::invalid_input(format!(
                    "valid to full vertex map must be strictly increasing, but entry {} is {} and entry {} is {}",
                    idx, pair[0].0, idx + 1, pair[1].0
                )));
            }
        }
        if let Some(last) = full_of_valid.last() {
            if last.0 >= n_full {
                return Err(RoiMaskError::invalid_input(format!(
                    "valid to full vertex map references {} but there are only {} full vertices",
                    last, n_full
                )));
            }
        }
        Ok(ValidVertexMap { full_of_valid, n_full })
    }


    /// The map in which every Full vertex is valid.
    pub fn identity(n_full: usize) -> ValidVertexMap {
        ValidVertexMap {
            full_of_valid: (0..n_full).map(FullVertex).collect(),
            n_full,
        }
    }


    /// Build the map from the vertices a flattened mesh references in its faces.
    ///
    /// Vertices of the flat mesh which are not part of any face are medial wall vertices
    /// and are excluded from the Valid space.
    pub fn from_mesh_faces(flat: &crate::mesh::BrainMesh) -> Result<ValidVertexMap> {
        let used = flat.referenced_vertices()?;
        ValidVertexMap::new(used.into_iter().map(FullVertex).collect(), flat.num_vertices())
    }


    /// Number of Valid vertices.
    pub fn num_valid(&self) -> usize {
        self.full_of_valid.len()
    }

    /// Number of Full vertices.
    pub fn num_full(&self) -> usize {
        self.n_full
    }

    /// The raw `vertIdx` array.
    pub fn as_slice(&self) -> &[FullVertex] {
        &self.full_of_valid
    }


    /// Translate Valid ids to Full ids elementwise.
    ///
    /// All ids must be below [`ValidVertexMap::num_valid`], otherwise an [`RoiMaskError::InvalidInput`] is returned.
    pub fn valid_to_full(&self, valid_ids: &[ValidVertex]) -> Result<Vec<FullVertex>> {
        valid_ids
            .iter()
            .map(|v| {
                self.full_of_valid.get(v.0).copied().ok_or_else(|| {
                    RoiMaskError::invalid_input(format!(
                        "{} is out of range, there are {} valid vertices",
                        v,
                        self.num_valid()
                    ))
                })
            })
            .collect()
    }


    /// Inverse of [`ValidVertexMap::valid_to_full`] for a single id. `None` for medial wall vertices.
    pub fn full_to_valid(&self, full: FullVertex) -> Option<ValidVertex> {
        self.full_of_valid.binary_search(&full).ok().map(ValidVertex)
    }


    /// Scatter a Valid space mask into a zero initialized Full space mask.
    pub fn full_membership_from_valid(&self, valid_mask: &Array1<bool>) -> Result<Array1<bool>> {
        if valid_mask.len() != self.num_valid() {
            return Err(RoiMaskError::invalid_input(format!(
                "valid vertex mask has length {} but there are {} valid vertices",
                valid_mask.len(),
                self.num_valid()
            )));
        }
        let mut full_mask = Array1::from_elem(self.n_full, false);
        for (valid_idx, _) in valid_mask.iter().enumerate().filter(|(_, m)| **m) {
            full_mask[self.full_of_valid[valid_idx].0] = true;
        }
        Ok(full_mask)
    }


    /// Gather a Full space mask back into Valid space. Membership of medial wall vertices is dropped.
    pub fn valid_membership_from_full(&self, full_mask: &Array1<bool>) -> Result<Array1<bool>> {
        if full_mask.len() != self.n_full {
            return Err(RoiMaskError::invalid_input(format!(
                "full vertex mask has length {} but there are {} full vertices",
                full_mask.len(),
                self.n_full
            )));
        }
        Ok(self.full_of_valid.iter().map(|f| full_mask[f.0]).collect())
    }


    /// A Valid space mask with the given ids set.
    pub fn valid_mask(&self, valid_ids: &[ValidVertex]) -> Result<Array1<bool>> {
        let mut mask = Array1::from_elem(self.num_valid(), false);
        for v in valid_ids {
            if v.0 >= self.num_valid() {
                return Err(RoiMaskError::invalid_input(format!(
                    "{} is out of range, there are {} valid vertices",
                    v,
                    self.num_valid()
                )));
            }
            mask[v.0] = true;
        }
        Ok(mask)
    }
}


/// Per voxel membership: a voxel is a member iff its nearest vertex is set in `full_mask`.
pub fn voxel_membership_from_full(full_mask: &Array1<bool>, nearest: &Array3<FullVertex>) -> Result<Array3<bool>> {
    if let Some(bad) = nearest.iter().find(|v| v.0 >= full_mask.len()) {
        return Err(RoiMaskError::invalid_input(format!(
            "nearest vertex volume references {} but the mask covers {} full vertices",
            bad,
            full_mask.len()
        )));
    }
    Ok(nearest.mapv(|v| full_mask[v.0]))
}


#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;

    fn medial_wall_map() -> ValidVertexMap {
        // 8 full vertices, 2 and 5 are medial wall
        let ids = vec![0, 1, 3, 4, 6, 7].into_iter().map(FullVertex).collect();
        ValidVertexMap::new(ids, 8).unwrap()
    }

    #[test]
    fn valid_ids_are_translated_to_full_ids() {
        let map = medial_wall_map();
        let full = map.valid_to_full(&[ValidVertex(0), ValidVertex(2), ValidVertex(5)]).unwrap();
        assert_eq!(full, vec![FullVertex(0), FullVertex(3), FullVertex(7)]);
    }

    #[test]
    fn out_of_range_valid_ids_are_rejected() {
        let map = medial_wall_map();
        assert!(map.valid_to_full(&[ValidVertex(6)]).is_err());
        assert!(map.valid_mask(&[ValidVertex(6)]).is_err());
    }

    #[test]
    fn a_non_increasing_map_is_rejected() {
        let ids = vec![0, 3, 3].into_iter().map(FullVertex).collect();
        assert!(ValidVertexMap::new(ids, 8).is_err());

        let ids = vec![0, 8].into_iter().map(FullVertex).collect();
        assert!(ValidVertexMap::new(ids, 8).is_err());
    }

    #[test]
    fn full_membership_round_trips_to_valid_membership() {
        let map = medial_wall_map();
        let regions: Vec<Vec<ValidVertex>> = vec![
            vec![],
            vec![ValidVertex(0)],
            vec![ValidVertex(1), ValidVertex(2), ValidVertex(5)],
            (0..6).map(ValidVertex).collect(),
        ];
        for region in regions {
            let valid_mask = map.valid_mask(&region).unwrap();
            let full_mask = map.full_membership_from_valid(&valid_mask).unwrap();
            assert_eq!(8, full_mask.len());
            assert!(!full_mask[2] && !full_mask[5]);

            let back = map.valid_membership_from_full(&full_mask).unwrap();
            assert_eq!(valid_mask, back);

            let ids_back: Vec<ValidVertex> = map
                .valid_to_full(&region)
                .unwrap()
                .into_iter()
                .map(|f| map.full_to_valid(f).unwrap())
                .collect();
            assert_eq!(region, ids_back);
        }
    }

    #[test]
    fn the_valid_space_of_a_flat_mesh_excludes_the_medial_wall() {
        // vertex 2 is in no face
        let flat = crate::mesh::BrainMesh::new(vec![0.0; 15], vec![0, 1, 3, 1, 3, 4]).unwrap();
        let map = ValidVertexMap::from_mesh_faces(&flat).unwrap();
        assert_eq!(4, map.num_valid());
        assert_eq!(5, map.num_full());
        assert_eq!(&[FullVertex(0), FullVertex(1), FullVertex(3), FullVertex(4)], map.as_slice());
    }

    #[test]
    fn medial_wall_vertices_have_no_valid_id() {
        let map = medial_wall_map();
        assert_eq!(None, map.full_to_valid(FullVertex(2)));
        assert_eq!(Some(ValidVertex(4)), map.full_to_valid(FullVertex(6)));
    }

    #[test]
    fn voxel_membership_is_a_set_membership_test() {
        let full_mask = array![true, false, true, false];
        let nearest = Array3::from_shape_vec(
            (1, 2, 2),
            vec![FullVertex(0), FullVertex(1), FullVertex(2), FullVertex(3)],
        )
        .unwrap();
        let vox = voxel_membership_from_full(&full_mask, &nearest).unwrap();
        assert_eq!(vox.iter().copied().collect::<Vec<bool>>(), vec![true, false, true, false]);

        let too_short = array![true];
        assert!(voxel_membership_from_full(&too_short, &nearest).is_err());
    }

    #[test]
    fn hemisphere_masks_are_complementary() {
        let nearest = Array3::from_shape_vec(
            (2, 1, 2),
            vec![FullVertex(0), FullVertex(3), FullVertex(1), FullVertex(2)],
        )
        .unwrap();
        let (left, right) = hemisphere_mask(&nearest, 2);
        assert_eq!(left.iter().copied().collect::<Vec<bool>>(), vec![true, false, true, false]);
        for (l, r) in left.iter().zip(right.iter()) {
            assert_ne!(l, r);
        }
    }

    #[test]
    fn hemisphere_split_assigns_vertices() {
        let split = HemiSplit::new(2, 4).unwrap();
        assert_eq!(Hemisphere::Left, split.hemisphere_of(FullVertex(1)));
        assert_eq!(Hemisphere::Right, split.hemisphere_of(FullVertex(2)));
        assert!(HemiSplit::new(5, 4).is_err());
    }
}
