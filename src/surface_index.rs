//! Nearest surface vertex queries for arbitrary points in world space.
//!
//! The index is a KD-tree over all Full space vertices of the fiducial surface. It is built
//! once from the whole vertex slice and never modified afterwards, batched queries run in parallel.
//! Coincident vertices are stored once, under their lowest vertex id.

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use log::debug;
use rayon::prelude::*;

use std::fmt;

use crate::error::{Result, RoiMaskError};
use crate::mesh::BrainMesh;
use crate::vertex_space::FullVertex;

/// A static nearest neighbour index over surface vertices.
pub struct SurfaceIndex {
    tree: ImmutableKdTree<f64, 3>,
    /// Full vertex id of each tree item.
    ids: Vec<usize>,
    num_vertices: usize,
}

/// Result of a nearest vertex query: the vertex and the euclidean distance to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestVertex {
    pub vertex: FullVertex,
    pub distance: f64,
}


impl SurfaceIndex {

    /// Build the index over all vertices of a (merged, fiducial) mesh.
    ///
    /// Fails with [`RoiMaskError::InvalidInput`] if the mesh has no vertices or a vertex coordinate is not finite.
    pub fn from_mesh(mesh: &BrainMesh) -> Result<SurfaceIndex> {
        let points: Vec<[f64; 3]> = mesh
            .vertex_coords()
            .map(|c| [f64::from(c[0]), f64::from(c[1]), f64::from(c[2])])
            .collect();
        SurfaceIndex::from_points(&points)
    }


    /// Build the index over the given points. The index of a point in `points` is its Full vertex id.
    pub fn from_points(points: &[[f64; 3]]) -> Result<SurfaceIndex> {
        if points.is_empty() {
            return Err(RoiMaskError::invalid_input("cannot build a surface index without vertices"));
        }

        if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| p.iter().any(|c| !c.is_finite())) {
            return Err(RoiMaskError::invalid_input(format!(
                "vertex {} has non-finite coordinates {:?}",
                i, p
            )));
        }

        let (unique, ids) = collapse_coincident(points);
        if unique.len() < points.len() {
            debug!("{} coincident vertices share a position with a lower vertex id", points.len() - unique.len());
        }
        let tree: ImmutableKdTree<f64, 3> = ImmutableKdTree::new_from_slice(&unique);

        Ok(SurfaceIndex { tree, ids, num_vertices: points.len() })
    }


    /// Number of indexed vertices.
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }


    /// The vertex closest to `p` and its distance.
    pub fn nearest(&self, p: &[f64; 3]) -> NearestVertex {
        let nn = self.tree.nearest_one::<SquaredEuclidean>(p);
        NearestVertex {
            vertex: FullVertex(self.ids[nn.item as usize]),
            distance: nn.distance.sqrt(),
        }
    }


    /// Nearest vertex for every query point, in input order.
    pub fn nearest_batch(&self, points: &[[f64; 3]]) -> Vec<NearestVertex> {
        points.par_iter().map(|p| self.nearest(p)).collect()
    }
}


/// Distinct positions of `points` plus, for each, the lowest index of a point at that position.
fn collapse_coincident(points: &[[f64; 3]]) -> (Vec<[f64; 3]>, Vec<usize>) {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (&points[a], &points[b]);
        pa[0].total_cmp(&pb[0])
            .then(pa[1].total_cmp(&pb[1]))
            .then(pa[2].total_cmp(&pb[2]))
            .then(a.cmp(&b))
    });

    let mut unique: Vec<[f64; 3]> = Vec::with_capacity(points.len());
    let mut ids: Vec<usize> = Vec::with_capacity(points.len());
    for i in order {
        if unique.last().map_or(false, |last| *last == points[i]) {
            continue;
        }
        unique.push(points[i]);
        ids.push(i);
    }
    (unique, ids)
}


impl fmt::Display for SurfaceIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Surface index over {} vertices.", self.num_vertices)
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn brute_force(points: &[[f64; 3]], q: &[f64; 3]) -> (usize, f64) {
        let mut best = (0, f64::MAX);
        for (i, p) in points.iter().enumerate() {
            let d = ((p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2) + (p[2] - q[2]).powi(2)).sqrt();
            if d < best.1 {
                best = (i, d);
            }
        }
        best
    }

    #[test]
    fn an_empty_vertex_set_is_rejected() {
        assert!(matches!(SurfaceIndex::from_points(&[]), Err(RoiMaskError::InvalidInput(_))));
        assert!(SurfaceIndex::from_mesh(&BrainMesh::default()).is_err());
    }

    #[test]
    fn non_finite_vertices_are_rejected() {
        assert!(SurfaceIndex::from_points(&[[0.0, f64::INFINITY, 0.0]]).is_err());
    }

    #[test]
    fn the_nearest_vertex_and_distance_are_found() {
        let points = [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]];
        let index = SurfaceIndex::from_points(&points).unwrap();
        assert_eq!(4, index.num_vertices());

        let nn = index.nearest(&[9.0, 1.0, 0.0]);
        assert_eq!(FullVertex(1), nn.vertex);
        assert_abs_diff_eq!(nn.distance, 2.0_f64.sqrt(), epsilon = 1e-12);

        let nn = index.nearest(&[0.0, 0.0, 0.0]);
        assert_eq!(FullVertex(0), nn.vertex);
        assert_abs_diff_eq!(nn.distance, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn batched_queries_agree_with_a_linear_scan() {
        // points on a coarse spiral, queries on a grid around it
        let points: Vec<[f64; 3]> = (0..200)
            .map(|i| {
                let t = i as f64 * 0.173;
                [t.cos() * (5.0 + t), t.sin() * (5.0 + t), 0.37 * t]
            })
            .collect();
        let queries: Vec<[f64; 3]> = (0..1000)
            .map(|i| [(i % 10) as f64 * 4.1 - 20.0, ((i / 10) % 10) as f64 * 4.3 - 20.0, (i / 100) as f64 * 1.3])
            .collect();

        let index = SurfaceIndex::from_points(&points).unwrap();
        let found = index.nearest_batch(&queries);
        assert_eq!(queries.len(), found.len());

        for (q, nn) in queries.iter().zip(found.iter()) {
            let (_, dist) = brute_force(&points, q);
            assert_abs_diff_eq!(nn.distance, dist, epsilon = 1e-9);
        }
    }

    #[test]
    fn a_planar_patch_can_be_indexed() {
        let points: Vec<[f64; 3]> = (0..100).map(|i| [0.0, (i % 10) as f64, (i / 10) as f64]).collect();
        let index = SurfaceIndex::from_points(&points).unwrap();
        assert_eq!(100, index.num_vertices());

        let nn = index.nearest(&[2.0, 3.0, 4.0]);
        assert_eq!(FullVertex(43), nn.vertex);
        assert_abs_diff_eq!(nn.distance, 2.0, epsilon = 1e-12);

        for (i, q) in points.iter().enumerate().step_by(7) {
            assert_eq!(FullVertex(i), index.nearest(q).vertex);
        }
    }

    #[test]
    fn coincident_vertices_resolve_to_the_lowest_id() {
        let mut points = vec![[5.0, 5.0, 5.0]];
        points.extend(std::iter::repeat([1.0, 2.0, 3.0]).take(40));
        let index = SurfaceIndex::from_points(&points).unwrap();
        assert_eq!(41, index.num_vertices());

        let nn = index.nearest(&[1.0, 2.0, 4.0]);
        assert_eq!(FullVertex(1), nn.vertex);
        assert_abs_diff_eq!(nn.distance, 1.0, epsilon = 1e-12);
        assert_eq!(FullVertex(0), index.nearest(&[5.0, 5.0, 6.0]).vertex);
    }
}
