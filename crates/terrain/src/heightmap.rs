use std::f64::consts::FRAC_PI_2;

use dualmesh::compute::*;
use dualmesh::geometry::distance;
use dualmesh::*;

use rand::Rng;

/// Site elevations. This array is the only place terrain height is stored;
/// corner heights and slopes are always derived from it.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    sites: SiteData<f64>,
}

impl HeightMap {
    pub fn new(mesh: &DualMesh, seed_elevation: f64) -> Self {
        Self {
            sites: SiteData::uniform(mesh, seed_elevation),
        }
    }

    pub fn from_elevations(sites: SiteData<f64>) -> Self {
        Self { sites }
    }

    pub fn elevation(&self, id: SiteId) -> f64 {
        self.sites[id]
    }

    pub fn sites(&self) -> &SiteData<f64> {
        &self.sites
    }

    pub fn sites_mut(&mut self) -> &mut SiteData<f64> {
        &mut self.sites
    }

    /// Tilts the whole map along `direction`: each site is placed in the bounds
    /// on both axes as -0.5..0.5, projected onto the unit direction and scaled
    /// by `strength / 4`. A zero direction leaves the map untouched.
    pub fn slope_global(&mut self, mesh: &DualMesh, direction: Coord<f64>, strength: f64) {
        let length = direction.x.hypot(direction.y);
        if length == 0.0 {
            log::debug!("Global slope skipped, direction has zero length");
            return;
        }
        let dir = direction / length;
        let bounds = mesh.bounds();
        let min = bounds.min();
        let (w, h) = (bounds.width(), bounds.height());

        self.sites.par_update_each(mesh, |_, site, z| {
            let x_pct = (site.x() - min.x) / w - 0.5;
            let y_pct = (site.y() - min.y) / h - 0.5;
            *z += (x_pct * dir.x + y_pct * dir.y) * strength / 4.0;
        })
    }

    /// Radial gradient around the bounds center: a basin rising to the rim,
    /// or a dome when `inverted`.
    pub fn conify(&mut self, mesh: &DualMesh, inverted: bool, strength: f64) {
        let bounds = mesh.bounds();
        let center = bounds.center();
        let max_distance = distance(bounds.min(), center);
        let sign = if inverted { -1.0 } else { 1.0 };

        self.sites.par_update_each(mesh, |_, site, z| {
            let scaled = distance(site.position(), center) / max_distance - 0.5;
            *z += scaled * strength / 2.0 * sign;
        })
    }

    /// Adds `strength * cos(d / radius * pi/2)` to every site within `radius`
    /// of `center`. The bump has zero slope at its rim and nothing beyond it.
    /// Without a center one is drawn uniformly from the mesh bounds.
    pub fn blob(
        &mut self,
        mesh: &DualMesh,
        strength: f64,
        radius: f64,
        center: Option<Coord<f64>>,
        rng: &mut impl Rng,
    ) {
        let center = center.unwrap_or_else(|| mesh.random_location(rng));
        if !(radius > 0.0) {
            return;
        }

        self.sites.par_update_each(mesh, |_, site, z| {
            let d = distance(site.position(), center);
            if d > radius {
                return;
            }
            *z += strength * (d / radius * FRAC_PI_2).cos();
        })
    }

    pub fn height_span(&self) -> (f64, f64) {
        (self.sites.min(), self.sites.max())
    }

    /// Rescales linearly so the lowest site sits at `min` and the highest at
    /// `max`. A flat map has no span to stretch and is moved to `min`.
    pub fn set_height_span(&mut self, min: f64, max: f64) {
        let (low, high) = self.height_span();
        let span = high - low;
        let new_span = max - min;

        if span > 0.0 {
            self.sites
                .data
                .iter_mut()
                .for_each(|z| *z = (*z - low) / span * new_span + min);
        } else {
            self.sites.data.iter_mut().for_each(|z| *z = min);
        }
    }

    pub fn normalize(&mut self) {
        self.set_height_span(0.0, 1.0)
    }
}
