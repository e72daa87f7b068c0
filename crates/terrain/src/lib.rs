pub mod conf;
pub mod derived;
pub mod error;
pub mod heightmap;
pub mod hydrology;

use rand::rngs::SmallRng;
use rand::*;

use dualmesh::compute::*;
use dualmesh::geometry::Vec3;
use dualmesh::*;

pub use conf::Settings;
pub use error::{TerrainError, TerrainResult};
pub use heightmap::HeightMap;
pub use hydrology::{Drainage, FillConfig, FillReport, FilledSurface, FlowField};

/// Result of one generation run over a mesh.
#[derive(Clone, Debug)]
pub struct Terrain {
    pub seed: u64,
    pub heightmap: HeightMap,
    pub filled: FilledSurface,
    pub flow: FlowField,
}

impl Terrain {
    pub fn corner_elevation(&self, mesh: &DualMesh) -> CornerData<f64> {
        derived::corner_elevation(mesh, self.heightmap.sites())
    }

    pub fn elevated_corners(&self, mesh: &DualMesh) -> CornerData<Vec3> {
        derived::elevated_corners(mesh, self.heightmap.sites())
    }

    pub fn slope_vectors(&self, mesh: &DualMesh) -> SiteData<derived::SlopeVector> {
        derived::slope_vectors(mesh, self.heightmap.sites())
    }
}

pub struct TerrainGenerator {
    settings: Settings,
}

impl TerrainGenerator {
    pub fn new(settings: Settings) -> TerrainResult<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Lattice triangulation over the configured bounds at the configured
    /// resolution, for callers without a triangulator of their own.
    pub fn grid_mesh(&self) -> TerrainResult<DualMesh> {
        let (cols, rows) = self.settings.grid_dimensions();
        let bounds = self.settings.bounds();
        let triangulation = Triangulation::grid(bounds, cols, rows)?;
        Ok(DualMesh::with_bounds(&triangulation, bounds)?)
    }

    /// Shapes the heightmap only. Every random draw comes from `rng`, so equal
    /// seeds give equal maps.
    pub fn heightmap(&self, mesh: &DualMesh, rng: &mut impl Rng) -> HeightMap {
        let morph = &self.settings.morph;
        let mut hm = HeightMap::new(mesh, self.settings.seed_elevation);

        let direction = match morph.slope.direction {
            Some([x, y]) => Coord { x, y },
            None => {
                let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                Coord {
                    x: angle.cos(),
                    y: angle.sin(),
                }
            }
        };
        log::debug!(
            "Global slope towards ({:.3}, {:.3}), strength {}",
            direction.x,
            direction.y,
            morph.slope.strength
        );
        hm.slope_global(mesh, direction, morph.slope.strength);

        log::debug!(
            "Cone, inverted = {}, strength {}",
            morph.cone.inverted,
            morph.cone.strength
        );
        hm.conify(mesh, morph.cone.inverted, morph.cone.strength);

        for hill in morph.hills.iter() {
            log::debug!(
                "{} hills of strength {} and radius {}",
                hill.count,
                hill.strength,
                hill.radius
            );
            for _ in 0..hill.count {
                hm.blob(mesh, hill.strength, hill.radius, None, rng);
            }
        }

        if let Some(span) = morph.normalize {
            hm.set_height_span(span.min, span.max);
        }
        hm
    }

    /// Runs the whole pipeline. `entropy` is only drawn from when no seed is
    /// configured; the run itself always uses a `SmallRng` built from the seed.
    pub fn generate(&self, mesh: &DualMesh, entropy: &mut impl Rng) -> Terrain {
        let seed = self.settings.seed.unwrap_or_else(|| entropy.gen());
        log::info!("Generating terrain with seed {}", seed);
        let mut rng = SmallRng::seed_from_u64(seed);

        let heightmap = self.heightmap(mesh, &mut rng);

        let hydrology = &self.settings.hydrology;
        let filled = hydrology::planchon_darboux(mesh, &heightmap, &FillConfig::from(hydrology));
        let flow = hydrology::accumulate_flow(mesh, &filled, hydrology.rainfall);

        let (low, high) = heightmap.height_span();
        log::info!(
            "Terrain ready: elevation {:.3}..{:.3}, {} fill passes, {} undrained sites",
            low,
            high,
            filled.report().iterations,
            flow.undrained_count()
        );

        Terrain {
            seed,
            heightmap,
            filled,
            flow,
        }
    }
}
