use thiserror::Error;

pub type MeshResult<T> = Result<T, MeshError>;

/// Structural problems found while turning a triangulation into a dual mesh.
///
/// Every variant aborts construction: no partially built mesh is ever handed out.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("triangulation has no triangles")]
    Empty,

    #[error("triangle index list has {len} entries, which is not a multiple of 3")]
    TriangleIndexCount { len: usize },

    #[error("twin table has {twins} entries but there are {half_edges} half-edges")]
    TwinCountMismatch { half_edges: usize, twins: usize },

    #[error("half-edge {half_edge} starts at vertex {vertex}, but only {vertices} vertices exist")]
    VertexOutOfRange {
        half_edge: usize,
        vertex: usize,
        vertices: usize,
    },

    #[error("half-edge {half_edge} has twin {twin}, but only {half_edges} half-edges exist")]
    TwinOutOfRange {
        half_edge: usize,
        twin: usize,
        half_edges: usize,
    },

    #[error("half-edge {half_edge} points to twin {twin}, which does not point back")]
    AsymmetricTwin { half_edge: usize, twin: usize },

    #[error("half-edge {half_edge} and its twin {twin} do not share an edge between two triangles")]
    MismatchedTwin { half_edge: usize, twin: usize },

    #[error("half-edges {first} and {second} both run from vertex {from} to vertex {to}")]
    DuplicateEdge {
        first: usize,
        second: usize,
        from: usize,
        to: usize,
    },

    #[error("hull edge {half_edge} does not exist")]
    HullEdgeOutOfRange { half_edge: usize },

    #[error("hull edge {half_edge} has a twin and cannot lie on the boundary")]
    HullEdgeHasTwin { half_edge: usize },

    #[error("half-edge {half_edge} has no twin but is missing from the hull list")]
    MissingHullEdge { half_edge: usize },

    #[error("bounds must have a positive area, got {width} x {height}")]
    DegenerateBounds { width: f64, height: f64 },
}
