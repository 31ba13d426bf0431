// Brain surface meshes as handed over by a mesh provider.
// A mesh stores a triangular mesh, where each vertex is defined by its x,y,z coord and
// each face is defined by 3 vertices, stored as 3 indices into the vertices.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Result, RoiMaskError};


/// A brain mesh with flat vertex and face buffers: `vertices` holds 3 coordinates per vertex,
/// `faces` holds 3 vertex indices per triangle.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct BrainMesh {
    pub vertices: Vec<f32>,
    pub faces: Vec<i32>,
}


impl BrainMesh {

    /// Create a mesh, checking that both buffers hold whole triples and that all faces reference existing vertices.
    pub fn new(vertices: Vec<f32>, faces: Vec<i32>) -> Result<BrainMesh> {
        if vertices.len() % 3 != 0 {
            return Err(RoiMaskError::invalid_input(format!(
                "vertex buffer length {} is not a multiple of 3",
                vertices.len()
            )));
        }
        if faces.len() % 3 != 0 {
            return Err(RoiMaskError::invalid_input(format!(
                "face buffer length {} is not a multiple of 3",
                faces.len()
            )));
        }
        let mesh = BrainMesh { vertices, faces };
        let nv = mesh.num_vertices();
        if let Some(bad) = mesh.faces.iter().find(|&&f| f < 0 || f as usize >= nv) {
            return Err(RoiMaskError::invalid_input(format!(
                "face references vertex {} but the mesh has {} vertices",
                bad, nv
            )));
        }
        Ok(mesh)
    }


    /// Create a mesh without faces from a list of points. Only the vertices matter for correspondence computation.
    pub fn from_points(points: &[[f32; 3]]) -> BrainMesh {
        BrainMesh {
            vertices: points.iter().flat_map(|p| p.iter().copied()).collect(),
            faces: Vec::new(),
        }
    }


    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len() / 3
    }


    /// The coordinates of the vertex at index `idx`.
    pub fn vertex(&self, idx: usize) -> Option<[f32; 3]> {
        let start = idx.checked_mul(3)?;
        let c = self.vertices.get(start..start + 3)?;
        Some([c[0], c[1], c[2]])
    }


    /// Iterate over the vertex coordinates in index order.
    pub fn vertex_coords(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.vertices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }


    /// Merge two meshes into one, e.g. left and right hemisphere. The vertices of `other` follow those
    /// of `self`, and the face indices of `other` are shifted accordingly.
    ///
    /// # Examples
    ///
    /// ```
    /// let lh = roimask::BrainMesh::new(vec![0.0; 9], vec![0, 1, 2]).unwrap();
    /// let rh = roimask::BrainMesh::new(vec![1.0; 9], vec![0, 1, 2]).unwrap();
    /// let both = lh.merge(&rh);
    /// assert_eq!(6, both.num_vertices());
    /// assert_eq!(vec![0, 1, 2, 3, 4, 5], both.faces);
    /// ```
    pub fn merge(&self, other: &BrainMesh) -> BrainMesh {
        let offset = self.num_vertices() as i32;
        let mut vertices = Vec::with_capacity(self.vertices.len() + other.vertices.len());
        vertices.extend_from_slice(&self.vertices);
        vertices.extend_from_slice(&other.vertices);

        let mut faces = Vec::with_capacity(self.faces.len() + other.faces.len());
        faces.extend_from_slice(&self.faces);
        faces.extend(other.faces.iter().map(|f| f + offset));

        BrainMesh { vertices, faces }
    }


    /// The sorted, unique indices of all vertices that are part of at least one face.
    ///
    /// On a flattened surface, vertices outside of every face are the cut out medial wall.
    pub fn referenced_vertices(&self) -> Result<Vec<usize>> {
        let nv = self.num_vertices();
        let mut used: BTreeSet<usize> = BTreeSet::new();
        for &f in &self.faces {
            if f < 0 || f as usize >= nv {
                return Err(RoiMaskError::invalid_input(format!(
                    "face references vertex {} but the mesh has {} vertices",
                    f, nv
                )));
            }
            used.insert(f as usize);
        }
        Ok(used.into_iter().collect())
    }
}


impl fmt::Display for BrainMesh {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Brain mesh with {} vertices and {} faces.", self.num_vertices(), self.num_faces())
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn a_mesh_with_broken_buffers_is_rejected() {
        assert!(BrainMesh::new(vec![0.0; 8], vec![]).is_err());
        assert!(BrainMesh::new(vec![0.0; 9], vec![0, 1]).is_err());
        assert!(BrainMesh::new(vec![0.0; 9], vec![0, 1, 3]).is_err());
        assert!(BrainMesh::new(vec![0.0; 9], vec![0, 1, -1]).is_err());
    }

    #[test]
    fn vertices_can_be_accessed_by_index() {
        let mesh = BrainMesh::from_points(&[[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        assert_eq!(2, mesh.num_vertices());
        assert_eq!(Some([3.0, 4.0, 5.0]), mesh.vertex(1));
        assert_eq!(None, mesh.vertex(2));
        assert_eq!(2, mesh.vertex_coords().count());
    }

    #[test]
    fn merged_meshes_keep_their_topology() {
        let lh = BrainMesh::new(vec![0.0; 12], vec![0, 1, 2, 1, 2, 3]).unwrap();
        let rh = BrainMesh::new(vec![1.0; 9], vec![2, 1, 0]).unwrap();
        let both = lh.merge(&rh);

        assert_eq!(7, both.num_vertices());
        assert_eq!(3, both.num_faces());
        assert_eq!(&both.faces[6..], &[6, 5, 4]);
        assert_eq!(Some([1.0, 1.0, 1.0]), both.vertex(4));
    }

    #[test]
    fn unreferenced_vertices_are_excluded() {
        // vertex 2 and 5 belong to no face
        let flat = BrainMesh::new(vec![0.0; 18], vec![0, 1, 3, 3, 4, 1]).unwrap();
        assert_eq!(vec![0, 1, 3, 4], flat.referenced_vertices().unwrap());
        assert_eq!("Brain mesh with 6 vertices and 2 faces.", format!("{}", flat));
    }
}
