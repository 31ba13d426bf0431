use crate::error::Result;
use crate::vertex_space::{ValidVertex, ValidVertexMap};

/// A provider of named surface regions, defined on the flattened surface.
///
/// Region membership is expressed in Valid vertex space; the provider also owns the
/// mapping of Valid ids into the Full fiducial vertex space.
pub trait RegionSource {
    /// All region names the provider knows, in a stable order.
    fn region_names(&self) -> Vec<String>;

    /// The member vertices of the named region. Unknown names are an error.
    fn region_vertices(&self, name: &str) -> Result<Vec<ValidVertex>>;

    /// The Valid to Full vertex mapping the region vertices refer to.
    fn vertex_map(&self) -> &ValidVertexMap;
}
