//! Terrain height-field synthesis and hydrology on the dual of a triangulation.
//!
//! [`dualmesh`] turns a finished triangulation into an indexed site graph;
//! [`terrain`] shapes elevation on it, fills depressions and routes rainfall.

pub use dualmesh;
pub use terrain;

pub use dualmesh::{DualMesh, MeshError, SiteId, CornerId, Triangulation};
pub use terrain::{Settings, Terrain, TerrainError, TerrainGenerator};
