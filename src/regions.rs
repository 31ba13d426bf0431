//! An in-memory collection of named surface regions.
//!
//! Each region is a set of vertices of the flattened surface, as produced by a region editing
//! tool. Regions may overlap. The vertex ids are in Valid space, see [`ValidVertexMap`].

use std::fmt;

use crate::error::{Result, RoiMaskError};
use crate::traits::RegionSource;
use crate::vertex_space::{ValidVertex, ValidVertexMap};


/// Named regions on a flattened surface, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSet {
    vertex_map: ValidVertexMap,
    names: Vec<String>,
    members: Vec<Vec<ValidVertex>>,
}

impl RegionSet {

    /// An empty region set over the given vertex mapping.
    pub fn new(vertex_map: ValidVertexMap) -> RegionSet {
        RegionSet { vertex_map, names: Vec::new(), members: Vec::new() }
    }


    /// Add a region.
    ///
    /// Fails if a region of that name exists or a vertex id is not a valid vertex.
    /// Duplicate vertex ids are merged.
    ///
    /// # Examples
    ///
    /// ```
    /// use roimask::{RegionSet, ValidVertex, ValidVertexMap};
    /// let mut regions = RegionSet::new(ValidVertexMap::identity(10));
    /// regions.add_region("V1", &[ValidVertex(0), ValidVertex(3)]).unwrap();
    /// assert_eq!(1, regions.num_regions());
    /// assert!(regions.add_region("V2", &[ValidVertex(10)]).is_err());
    /// ```
    pub fn add_region<S: Into<String>>(&mut self, name: S, vertices: &[ValidVertex]) -> Result<()> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(RoiMaskError::invalid_input(format!("region '{}' is defined twice", name)));
        }
        if let Some(bad) = vertices.iter().find(|v| v.0 >= self.vertex_map.num_valid()) {
            return Err(RoiMaskError::invalid_input(format!(
                "region '{}' references {} but there are {} valid vertices",
                name,
                bad,
                self.vertex_map.num_valid()
            )));
        }

        let mut verts = vertices.to_vec();
        verts.sort_unstable();
        verts.dedup();
        self.names.push(name);
        self.members.push(verts);
        Ok(())
    }


    /// Get the region names.
    pub fn regions(&self) -> Vec<String> {
        self.names.clone()
    }


    /// Get the number of regions.
    pub fn num_regions(&self) -> usize {
        self.names.len()
    }


    /// Get the sorted vertex ids of the given region, or `None` if there is no such region.
    pub fn region(&self, name: &str) -> Option<&[ValidVertex]> {
        self.names.iter().position(|n| n == name).map(|idx| self.members[idx].as_slice())
    }
}


impl RegionSource for RegionSet {
    fn region_names(&self) -> Vec<String> {
        self.regions()
    }

    fn region_vertices(&self, name: &str) -> Result<Vec<ValidVertex>> {
        self.region(name)
            .map(|verts| verts.to_vec())
            .ok_or_else(|| RoiMaskError::invalid_input(format!("no such region: '{}'", name)))
    }

    fn vertex_map(&self) -> &ValidVertexMap {
        &self.vertex_map
    }
}


impl fmt::Display for RegionSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Region set with {} regions over {} valid vertices.",
            self.num_regions(),
            self.vertex_map.num_valid()
        )
    }
}
