use std::collections::HashMap;

use geo::{Coord, Rect};

use crate::error::{MeshError, MeshResult};

/// Finished output of a planar triangulator, in flat half-edge form.
///
/// Half-edge `e` belongs to triangle `e / 3` and starts at vertex `triangles[e]`;
/// the next half-edge of the same triangle is `next_half_edge(e)`. `twins[e]` is the
/// opposite half-edge in the adjacent triangle, or `None` on the outer boundary,
/// and `hull` lists exactly those twinless half-edges.
#[derive(Clone, Debug, Default)]
pub struct Triangulation {
    pub vertices: Vec<Coord<f64>>,
    pub triangles: Vec<usize>,
    pub twins: Vec<Option<usize>>,
    pub hull: Vec<usize>,
}

pub fn next_half_edge(e: usize) -> usize {
    if e % 3 == 2 {
        e - 2
    } else {
        e + 1
    }
}

impl Triangulation {
    /// Links a bare triangle list: twins are found by matching each directed edge
    /// with its reverse, and every unmatched edge goes to the hull.
    pub fn from_triangles(vertices: Vec<Coord<f64>>, triangles: Vec<usize>) -> MeshResult<Self> {
        if triangles.len() % 3 != 0 {
            return Err(MeshError::TriangleIndexCount {
                len: triangles.len(),
            });
        }
        if let Some((half_edge, &vertex)) = triangles
            .iter()
            .enumerate()
            .find(|(_, &v)| v >= vertices.len())
        {
            return Err(MeshError::VertexOutOfRange {
                half_edge,
                vertex,
                vertices: vertices.len(),
            });
        }

        let mut edges_lookup: HashMap<(usize, usize), usize> = HashMap::new();
        for e in 0..triangles.len() {
            let key = (triangles[e], triangles[next_half_edge(e)]);
            if let Some(&first) = edges_lookup.get(&key) {
                return Err(MeshError::DuplicateEdge {
                    first,
                    second: e,
                    from: key.0,
                    to: key.1,
                });
            }
            edges_lookup.insert(key, e);
        }

        let twins: Vec<_> = (0..triangles.len())
            .map(|e| {
                let reverse = (triangles[next_half_edge(e)], triangles[e]);
                edges_lookup.get(&reverse).copied()
            })
            .collect();

        let hull = twins
            .iter()
            .enumerate()
            .filter_map(|(e, twin)| if twin.is_none() { Some(e) } else { None })
            .collect();

        Ok(Self {
            vertices,
            triangles,
            twins,
            hull,
        })
    }

    /// A `cols` x `rows` lattice over `bounds`, each lattice cell split into two
    /// counter-clockwise triangles along the same diagonal.
    pub fn grid(bounds: Rect<f64>, cols: usize, rows: usize) -> MeshResult<Self> {
        let min = bounds.min();
        let dx = bounds.width() / cols.max(1) as f64;
        let dy = bounds.height() / rows.max(1) as f64;

        let mut vertices = Vec::with_capacity((cols + 1) * (rows + 1));
        for j in 0..=rows {
            for i in 0..=cols {
                vertices.push(Coord {
                    x: min.x + i as f64 * dx,
                    y: min.y + j as f64 * dy,
                });
            }
        }

        let vertex = |i: usize, j: usize| j * (cols + 1) + i;
        let mut triangles = Vec::with_capacity(cols * rows * 6);
        for j in 0..rows {
            for i in 0..cols {
                let (v00, v10) = (vertex(i, j), vertex(i + 1, j));
                let (v01, v11) = (vertex(i, j + 1), vertex(i + 1, j + 1));
                triangles.extend_from_slice(&[v00, v10, v11]);
                triangles.extend_from_slice(&[v00, v11, v01]);
            }
        }

        Self::from_triangles(vertices, triangles)
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn num_half_edges(&self) -> usize {
        self.triangles.len()
    }

    pub fn origin(&self, e: usize) -> usize {
        self.triangles[e]
    }

    pub fn twin(&self, e: usize) -> Option<usize> {
        self.twins[e]
    }

    pub fn triangle_of(&self, e: usize) -> usize {
        e / 3
    }
}
