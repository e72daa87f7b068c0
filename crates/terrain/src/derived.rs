//! Read-only fields computed from a site elevation array on demand.
//!
//! Nothing here is cached: callers recompute after every elevation change, which
//! keeps the site array the single source of truth.

use dualmesh::compute::*;
use dualmesh::geometry::Vec3;
use dualmesh::*;

/// Vertex elevation as the mean over the sites sharing that corner.
pub fn corner_elevation(mesh: &DualMesh, elevation: &SiteData<f64>) -> CornerData<f64> {
    CornerData::site_average(mesh, elevation)
}

/// Corner positions lifted to their derived elevation, ready for vertex output.
pub fn elevated_corners(mesh: &DualMesh, elevation: &SiteData<f64>) -> CornerData<Vec3> {
    let heights = corner_elevation(mesh, elevation);
    CornerData::for_each(mesh, |id, corner| Vec3::lift(corner.position(), heights[id]))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlopeVector {
    /// Mean of the vectors to each neighbor, each flipped to point downhill.
    pub vector: Vec3,
    /// Rise over run of `vector`; negative means descending.
    pub slope: f64,
}

pub fn slope_vectors(mesh: &DualMesh, surface: &SiteData<f64>) -> SiteData<SlopeVector> {
    let mut out = SiteData::uniform(
        mesh,
        SlopeVector {
            vector: Vec3::ZERO,
            slope: 0.0,
        },
    );

    out.par_update_each(mesh, |id, site, slot| {
        let here = Vec3::lift(site.position(), surface[id]);
        let mut sum = Vec3::ZERO;
        let mut count = 0;
        for neighbor in site.neighbors() {
            let there = Vec3::lift(mesh.site(neighbor).position(), surface[neighbor]);
            let mut v = there - here;
            if v.z > 0.0 {
                v = -v;
            }
            sum = sum + v;
            count += 1;
        }
        if count == 0 {
            return;
        }

        let vector = sum / count as f64;
        let run = vector.planar_length();
        let slope = if run > 0.0 { vector.z / run } else { 0.0 };
        *slot = SlopeVector { vector, slope };
    });
    out
}
