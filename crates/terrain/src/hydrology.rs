//! Depression filling and flow accumulation over the site graph.
//!
//! The filled surface is a routing aid only: it never replaces the terrain
//! elevation, and both arrays are kept because the accumulator walks the
//! filled one while the caller still renders the original.

use dualmesh::compute::*;
use dualmesh::geometry::Vec3;
use dualmesh::*;

use crate::conf::HydrologyConf;
use crate::heightmap::HeightMap;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillConfig {
    /// Minimum gradient forced between a filled site and the neighbor it drains
    /// into, per unit of planar distance. Zero allows flat filled plateaus.
    pub min_slope: f64,
    /// Cap on full passes. `None` runs until a pass changes nothing, which is
    /// exact but costs up to O(sites) passes. A cap bounds the cost and may
    /// leave a residual depression.
    pub max_iterations: Option<usize>,
}

impl From<&HydrologyConf> for FillConfig {
    fn from(conf: &HydrologyConf) -> Self {
        Self {
            min_slope: conf.min_slope,
            max_iterations: conf.max_fill_iterations,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillReport {
    pub iterations: usize,
    /// The last pass made no change.
    pub converged: bool,
    /// Sites a capped run never reached from the hull. They keep their
    /// original elevation.
    pub unresolved: usize,
}

#[derive(Clone, Debug)]
pub struct FilledSurface {
    heights: SiteData<f64>,
    report: FillReport,
}

impl FilledSurface {
    pub fn height(&self, id: SiteId) -> f64 {
        self.heights[id]
    }

    pub fn heights(&self) -> &SiteData<f64> {
        &self.heights
    }

    pub fn report(&self) -> FillReport {
        self.report
    }
}

/// Planchon-Darboux: hull sites are pinned at their elevation, every other
/// site starts at +inf and is lowered toward `neighbor + epsilon` (or all the
/// way back to its own elevation once that already drains) until nothing moves.
pub fn planchon_darboux(mesh: &DualMesh, heightmap: &HeightMap, config: &FillConfig) -> FilledSurface {
    let h = heightmap.sites();
    let mut w = SiteData::for_each(mesh, |id, site| {
        if site.is_hull() {
            h[id]
        } else {
            f64::INFINITY
        }
    });

    let mut iterations = 0;
    let mut changed = true;
    while changed {
        if config.max_iterations.is_some_and(|max| iterations >= max) {
            break;
        }
        changed = false;
        iterations += 1;

        for (id, site) in mesh.sites() {
            if site.is_hull() || !(w[id] > h[id]) {
                continue;
            }
            for neighbor in site.neighbors() {
                let epsilon = mesh.site_distance(id, neighbor) * config.min_slope;
                let wpn = w[neighbor] + epsilon;
                if h[id] >= wpn {
                    w[id] = h[id];
                    changed = true;
                    break;
                }
                if w[id] > wpn {
                    w[id] = wpn;
                    changed = true;
                }
            }
        }
        log::trace!("Fill pass {}: changed = {}", iterations, changed);
    }

    let mut unresolved = 0;
    for (id, z) in w.data.iter_mut().enumerate() {
        if z.is_infinite() {
            *z = h.data[id];
            unresolved += 1;
        }
    }

    let report = FillReport {
        iterations,
        converged: !changed,
        unresolved,
    };
    if report.converged {
        log::debug!("Depression fill converged after {} passes", iterations);
    } else {
        log::warn!(
            "Depression fill stopped at the {}-pass cap before converging, {} sites unresolved",
            iterations,
            unresolved
        );
    }

    FilledSurface { heights: w, report }
}

/// Where a site's accumulated flux goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Drainage {
    /// Passed on to the steepest lower neighbor.
    Downhill(SiteId),
    /// Hull site: the flux leaves the map here.
    Outlet,
    /// Interior site with no neighbor to drain into. The flux stays stranded.
    Undrained,
}

#[derive(Clone, Debug)]
pub struct FlowField {
    flux: SiteData<f64>,
    direction: SiteData<Vec3>,
    drainage: SiteData<Drainage>,
    rainfall: f64,
}

impl FlowField {
    pub fn flux(&self, id: SiteId) -> f64 {
        self.flux[id]
    }

    pub fn fluxes(&self) -> &SiteData<f64> {
        &self.flux
    }

    /// Vector to the downhill target including the elevation drop; zero for
    /// outlets and undrained sites.
    pub fn direction(&self, id: SiteId) -> Vec3 {
        self.direction[id]
    }

    pub fn directions(&self) -> &SiteData<Vec3> {
        &self.direction
    }

    pub fn drainage(&self, id: SiteId) -> Drainage {
        self.drainage[id]
    }

    pub fn undrained(&self) -> impl Iterator<Item = SiteId> + '_ {
        self.drainage
            .iter()
            .filter(|(_, d)| **d == Drainage::Undrained)
            .map(|(id, _)| id)
    }

    pub fn undrained_count(&self) -> usize {
        self.undrained().count()
    }

    /// Total rain injected: rainfall on every site.
    pub fn total_rainfall(&self) -> f64 {
        self.rainfall * self.flux.len() as f64
    }

    /// Flux leaving the map through hull sites.
    pub fn outlet_discharge(&self) -> f64 {
        self.sum_where(Drainage::Outlet)
    }

    /// Flux stuck at undrained sites.
    pub fn stranded(&self) -> f64 {
        self.sum_where(Drainage::Undrained)
    }

    fn sum_where(&self, kind: Drainage) -> f64 {
        self.drainage
            .iter()
            .filter(|(_, d)| **d == kind)
            .map(|(id, _)| self.flux[id])
            .sum()
    }
}

/// Routes `rainfall` per site down the filled surface.
///
/// Sites are visited highest first, so a site's flux is complete before it is
/// passed on. The target is the neighbor with the steepest positive drop; a
/// neighbor at equal height is only eligible if it comes later in that order,
/// which keeps routing acyclic on flat ground.
pub fn accumulate_flow(mesh: &DualMesh, surface: &FilledSurface, rainfall: f64) -> FlowField {
    let w = surface.heights();
    let order = w.ordered_by(|a, b| b.total_cmp(a));

    let mut rank = SiteData::uniform(mesh, 0usize);
    for (position, &id) in order.iter().enumerate() {
        rank[id] = position;
    }

    let mut flux = SiteData::uniform(mesh, 0.0);
    let mut direction = SiteData::uniform(mesh, Vec3::ZERO);
    let mut drainage = SiteData::uniform(mesh, Drainage::Undrained);

    for &id in order.iter() {
        flux[id] += rainfall;

        let site = mesh.site(id);
        if site.is_hull() {
            drainage[id] = Drainage::Outlet;
            continue;
        }

        let mut target: Option<(SiteId, f64)> = None;
        for neighbor in site.neighbors() {
            let drop = w[id] - w[neighbor];
            let eligible = drop > 0.0 || (drop == 0.0 && rank[neighbor] > rank[id]);
            if !eligible {
                continue;
            }
            let slope = drop / mesh.site_distance(id, neighbor);
            let better = match target {
                None => true,
                Some((_, best)) => slope > best,
            };
            if better {
                target = Some((neighbor, slope));
            }
        }

        match target {
            Some((to, _)) => {
                let here = Vec3::lift(site.position(), w[id]);
                let there = Vec3::lift(mesh.site(to).position(), w[to]);
                direction[id] = there - here;
                drainage[id] = Drainage::Downhill(to);
                let outflow = flux[id];
                flux[to] += outflow;
            }
            None => drainage[id] = Drainage::Undrained,
        }
    }

    let field = FlowField {
        flux,
        direction,
        drainage,
        rainfall,
    };
    let undrained = field.undrained_count();
    if undrained > 0 {
        log::warn!(
            "{} sites have no downhill neighbor, {:.6} flux stranded",
            undrained,
            field.stranded()
        );
    }
    field
}
