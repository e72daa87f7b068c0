//! Indexed site graph built on top of a finished triangulation.
//!
//! Every triangle becomes a *site* placed at its centroid, every triangulation
//! vertex becomes a *corner*. Adjacency is stored as plain indices so the graph
//! has no reference cycles and is immutable once built; anything that changes
//! over a generation run lives in [`compute::SiteData`] / [`compute::CornerData`].

pub mod compute;
pub mod error;
pub mod geometry;
pub mod triangulation;

pub use error::{MeshError, MeshResult};
pub use geo::{Coord, Rect};
pub use triangulation::Triangulation;

use rand::Rng;
use triangulation::next_half_edge;

macro_rules! mesh_id {
    ($(#[$meta:meta])* $vis:vis $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, std::hash::Hash)]
        $vis struct $name(usize);

        impl $name {
            pub fn idx(&self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(u: usize) -> Self {
                Self(u)
            }
        }

        impl From<$name> for usize {
            fn from(s: $name) -> usize {
                s.0
            }
        }
    };
}

mesh_id!(
    /// One per triangle of the source triangulation.
    pub SiteId
);
mesh_id!(
    /// One per vertex of the source triangulation.
    pub CornerId
);

#[derive(Clone, Debug)]
pub struct Site {
    position: Coord<f64>,
    neighbors: [Option<SiteId>; 3],
    corners: [CornerId; 3],
    is_hull: bool,
}

impl Site {
    pub fn position(&self) -> Coord<f64> {
        self.position
    }
    pub fn x(&self) -> f64 {
        self.position.x
    }
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Neighbor across each of the triangle's three edges, `None` where the edge
    /// lies on the outer boundary. Slot `i` is the edge starting at `corners()[i]`.
    pub fn neighbor_slots(&self) -> &[Option<SiteId>; 3] {
        &self.neighbors
    }

    pub fn neighbors(&self) -> impl Iterator<Item = SiteId> + '_ {
        self.neighbors.iter().flatten().copied()
    }

    pub fn corners(&self) -> &[CornerId; 3] {
        &self.corners
    }

    pub fn is_hull(&self) -> bool {
        self.is_hull
    }
}

#[derive(Clone, Debug)]
pub struct Corner {
    position: Coord<f64>,
    sites: Vec<SiteId>,
}

impl Corner {
    pub fn position(&self) -> Coord<f64> {
        self.position
    }
    pub fn x(&self) -> f64 {
        self.position.x
    }
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Sites having this corner, ascending and without repeats.
    pub fn sites(&self) -> &[SiteId] {
        self.sites.as_slice()
    }

    fn fix(&mut self) {
        self.sites.sort();
        self.sites.dedup();
    }
}

pub struct DualMesh {
    bounds: Rect<f64>,
    sites: Vec<Site>,
    corners: Vec<Corner>,
    hull: Vec<SiteId>,
}

impl DualMesh {
    /// Builds the site graph, taking the bounding box of the vertices as bounds.
    pub fn new(triangulation: &Triangulation) -> MeshResult<Self> {
        let bounds = vertex_bounds(&triangulation.vertices).ok_or(MeshError::Empty)?;
        Self::with_bounds(triangulation, bounds)
    }

    pub fn with_bounds(triangulation: &Triangulation, bounds: Rect<f64>) -> MeshResult<Self> {
        if !(bounds.width() > 0.0 && bounds.height() > 0.0) {
            return Err(MeshError::DegenerateBounds {
                width: bounds.width(),
                height: bounds.height(),
            });
        }
        validate(triangulation)?;

        let num_triangles = triangulation.num_triangles();
        let mut corners: Vec<Corner> = triangulation
            .vertices
            .iter()
            .map(|&position| Corner {
                position,
                sites: vec![],
            })
            .collect();

        let mut sites = Vec::with_capacity(num_triangles);
        for t in 0..num_triangles {
            let site_id = SiteId(t);
            let mut site_corners = [CornerId(0); 3];
            let mut neighbors = [None; 3];
            let mut is_hull = false;

            for slot in 0..3 {
                let e = 3 * t + slot;
                let origin = triangulation.origin(e);
                site_corners[slot] = CornerId(origin);
                corners[origin].sites.push(site_id);

                match triangulation.twin(e) {
                    Some(twin) => neighbors[slot] = Some(SiteId(triangulation.triangle_of(twin))),
                    None => is_hull = true,
                }
            }

            let position = geometry::centroid(&site_corners.map(|c| corners[c.0].position));
            sites.push(Site {
                position,
                neighbors,
                corners: site_corners,
                is_hull,
            });
        }

        corners.iter_mut().for_each(|c| c.fix());

        let mut hull: Vec<_> = triangulation
            .hull
            .iter()
            .map(|&e| SiteId(triangulation.triangle_of(e)))
            .collect();
        hull.sort();
        hull.dedup();

        log::info!(
            "Dual mesh: {} sites, {} corners, {} hull sites",
            sites.len(),
            corners.len(),
            hull.len()
        );

        Ok(DualMesh {
            bounds,
            sites,
            corners,
            hull,
        })
    }

    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    pub fn sites(&self) -> impl Iterator<Item = (SiteId, &Site)> {
        self.sites
            .iter()
            .enumerate()
            .map(|(id, site)| (SiteId(id), site))
    }

    pub fn corners(&self) -> impl Iterator<Item = (CornerId, &Corner)> {
        self.corners
            .iter()
            .enumerate()
            .map(|(id, corner)| (CornerId(id), corner))
    }

    pub fn site(&self, id: SiteId) -> &Site {
        &self.sites[id.0]
    }

    pub fn corner(&self, id: CornerId) -> &Corner {
        &self.corners[id.0]
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn num_corners(&self) -> usize {
        self.corners.len()
    }

    pub fn is_hull(&self, id: SiteId) -> bool {
        self.sites[id.0].is_hull
    }

    pub fn hull_sites(&self) -> &[SiteId] {
        self.hull.as_slice()
    }

    pub fn site_distance(&self, a: SiteId, b: SiteId) -> f64 {
        geometry::distance(self.sites[a.0].position, self.sites[b.0].position)
    }

    /// Uniformly distributed location inside the bounds.
    pub fn random_location(&self, rng: &mut impl Rng) -> Coord<f64> {
        let min = self.bounds.min();
        Coord {
            x: min.x + rng.gen::<f64>() * self.bounds.width(),
            y: min.y + rng.gen::<f64>() * self.bounds.height(),
        }
    }
}

fn vertex_bounds(vertices: &[Coord<f64>]) -> Option<Rect<f64>> {
    let first = *vertices.first()?;
    let (min, max) = vertices.iter().fold((first, first), |(min, max), v| {
        (
            Coord {
                x: min.x.min(v.x),
                y: min.y.min(v.y),
            },
            Coord {
                x: max.x.max(v.x),
                y: max.y.max(v.y),
            },
        )
    });
    Some(Rect::new(min, max))
}

fn validate(tri: &Triangulation) -> MeshResult<()> {
    let half_edges = tri.num_half_edges();
    if half_edges % 3 != 0 {
        return Err(MeshError::TriangleIndexCount { len: half_edges });
    }
    if half_edges == 0 {
        return Err(MeshError::Empty);
    }
    if tri.twins.len() != half_edges {
        return Err(MeshError::TwinCountMismatch {
            half_edges,
            twins: tri.twins.len(),
        });
    }

    for e in 0..half_edges {
        let vertex = tri.origin(e);
        if vertex >= tri.vertices.len() {
            return Err(MeshError::VertexOutOfRange {
                half_edge: e,
                vertex,
                vertices: tri.vertices.len(),
            });
        }
        if let Some(twin) = tri.twin(e) {
            if twin >= half_edges {
                return Err(MeshError::TwinOutOfRange {
                    half_edge: e,
                    twin,
                    half_edges,
                });
            }
            if tri.twin(twin) != Some(e) {
                return Err(MeshError::AsymmetricTwin { half_edge: e, twin });
            }
            // Twins run the same edge in opposite directions across two triangles.
            let joins_reversed = tri.origin(twin) == tri.origin(next_half_edge(e))
                && tri.origin(next_half_edge(twin)) == tri.origin(e);
            if tri.triangle_of(twin) == tri.triangle_of(e) || !joins_reversed {
                return Err(MeshError::MismatchedTwin { half_edge: e, twin });
            }
        }
    }

    let mut on_hull = vec![false; half_edges];
    for &e in tri.hull.iter() {
        if e >= half_edges {
            return Err(MeshError::HullEdgeOutOfRange { half_edge: e });
        }
        if tri.twin(e).is_some() {
            return Err(MeshError::HullEdgeHasTwin { half_edge: e });
        }
        on_hull[e] = true;
    }
    if let Some(e) = (0..half_edges).find(|&e| tri.twin(e).is_none() && !on_hull[e]) {
        return Err(MeshError::MissingHullEdge { half_edge: e });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;
    use rand::{rngs::SmallRng, SeedableRng};

    fn grid_mesh(cols: usize, rows: usize) -> DualMesh {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 });
        DualMesh::new(&Triangulation::grid(bounds, cols, rows).unwrap()).unwrap()
    }

    #[test]
    fn every_site_has_three_slots() {
        let mesh = grid_mesh(5, 4);
        assert_eq!(mesh.num_sites(), 40);
        for (_, site) in mesh.sites() {
            assert_eq!(site.neighbor_slots().len(), 3);
            assert_eq!(site.corners().len(), 3);
        }
    }

    #[test]
    fn neighbors_and_corners_are_in_range() {
        let mesh = grid_mesh(5, 4);
        for (_, site) in mesh.sites() {
            assert!(site.neighbors().all(|n| n.idx() < mesh.num_sites()));
            assert!(site.corners().iter().all(|c| c.idx() < mesh.num_corners()));
        }
    }

    #[test]
    fn adjacency_is_symmetric() {
        let mesh = grid_mesh(5, 4);
        for (id, site) in mesh.sites() {
            for n in site.neighbors() {
                assert!(mesh.site(n).neighbors().any(|back| back == id));
            }
        }
    }

    #[test]
    fn corner_incidence_mirrors_site_corners() {
        let mesh = grid_mesh(5, 4);
        for (site_id, site) in mesh.sites() {
            for (corner_id, corner) in mesh.corners() {
                let forward = site.corners().contains(&corner_id);
                let backward = corner.sites().contains(&site_id);
                assert_eq!(forward, backward);
            }
        }
        assert!(mesh.corners().all(|(_, c)| !c.sites().is_empty()));
    }

    #[test]
    fn site_position_is_the_centroid() {
        let mesh = grid_mesh(1, 1);
        let site = mesh.site(SiteId(0));
        // Lower-right triangle of the single lattice cell: (0,0), (10,0), (10,10).
        assert!((site.x() - 20.0 / 3.0).abs() < 1e-12);
        assert!((site.y() - 10.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn hull_sites_are_the_ones_missing_a_neighbor() {
        let mesh = grid_mesh(5, 4);
        for (id, site) in mesh.sites() {
            let open = site.neighbor_slots().iter().any(|n| n.is_none());
            assert_eq!(open, site.is_hull());
            assert_eq!(open, mesh.hull_sites().contains(&id));
        }
        // Bottom row + right column expose the lower triangle, top row + left
        // column the upper one; each union counts its shared cell once.
        assert_eq!(mesh.hull_sites().len(), 2 * (5 + 4) - 2);
    }

    #[test]
    fn rejects_twin_out_of_range() {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        let mut tri = Triangulation::grid(bounds, 1, 1).unwrap();
        tri.twins[2] = Some(42);
        assert!(matches!(
            DualMesh::new(&tri),
            Err(MeshError::TwinOutOfRange { half_edge: 2, twin: 42, .. })
        ));
    }

    #[test]
    fn rejects_one_sided_twin() {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        let mut tri = Triangulation::grid(bounds, 1, 1).unwrap();
        tri.twins[0] = Some(4);
        assert!(matches!(
            DualMesh::new(&tri),
            Err(MeshError::AsymmetricTwin { half_edge: 0, twin: 4 })
        ));
    }

    #[test]
    fn rejects_twin_inside_the_same_triangle() {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        let mut tri = Triangulation::grid(bounds, 1, 1).unwrap();
        tri.twins[0] = Some(1);
        tri.twins[1] = Some(0);
        tri.hull.retain(|&e| e != 0 && e != 1);
        assert_eq!(
            DualMesh::new(&tri).err(),
            Some(MeshError::MismatchedTwin { half_edge: 0, twin: 1 })
        );
    }

    #[test]
    fn rejects_twin_over_a_different_edge() {
        // Half-edge 0 runs v00 -> v10, half-edge 4 runs v11 -> v01.
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        let mut tri = Triangulation::grid(bounds, 1, 1).unwrap();
        tri.twins[0] = Some(4);
        tri.twins[4] = Some(0);
        tri.hull.retain(|&e| e != 0 && e != 4);
        assert_eq!(
            DualMesh::new(&tri).err(),
            Some(MeshError::MismatchedTwin { half_edge: 0, twin: 4 })
        );
    }

    #[test]
    fn rejects_incomplete_hull_list() {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        let mut tri = Triangulation::grid(bounds, 1, 1).unwrap();
        let dropped = tri.hull.pop().unwrap();
        assert_eq!(
            DualMesh::new(&tri).err(),
            Some(MeshError::MissingHullEdge { half_edge: dropped })
        );
    }

    #[test]
    fn rejects_truncated_triangle_list() {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        let mut tri = Triangulation::grid(bounds, 1, 1).unwrap();
        tri.triangles.pop();
        assert_eq!(
            DualMesh::new(&tri).err(),
            Some(MeshError::TriangleIndexCount { len: 5 })
        );
    }

    #[test]
    fn random_location_stays_in_bounds() {
        let mesh = grid_mesh(2, 2);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..100 {
            let p = mesh.random_location(&mut rng);
            assert!((0.0..=10.0).contains(&p.x) && (0.0..=10.0).contains(&p.y));
        }
    }
}
