use dualmesh::{Coord, Rect};
use serde_derive::Deserialize;

use crate::error::{TerrainError, TerrainResult};

/// Everything a generation run reads. Every field has a default, so a settings
/// file only needs to name what it changes.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Drawn at random (and logged) when absent.
    pub seed: Option<u64>,
    pub bounds: BoundsConf,
    /// Points per unit area, consumed when sampling the triangulation.
    pub resolution: f64,
    pub seed_elevation: f64,
    pub morph: MorphConf,
    pub hydrology: HydrologyConf,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct BoundsConf {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MorphConf {
    pub slope: SlopeConf,
    pub cone: ConeConf,
    pub hills: Vec<HillConf>,
    pub normalize: Option<SpanConf>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct SlopeConf {
    /// Random unit direction when absent.
    pub direction: Option<[f64; 2]>,
    pub strength: f64,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ConeConf {
    pub inverted: bool,
    pub strength: f64,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct HillConf {
    pub count: usize,
    pub strength: f64,
    pub radius: f64,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SpanConf {
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct HydrologyConf {
    pub rainfall: f64,
    pub min_slope: f64,
    /// `None` iterates the depression filler to its exact fixpoint.
    pub max_fill_iterations: Option<usize>,
    /// Reserved for erosion, which is not part of this library.
    pub max_erosion_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            bounds: BoundsConf::default(),
            resolution: 1.0,
            seed_elevation: 0.5,
            morph: MorphConf::default(),
            hydrology: HydrologyConf::default(),
        }
    }
}

impl Default for BoundsConf {
    fn default() -> Self {
        Self {
            min: [1.0, 1.0],
            max: [500.0, 500.0],
        }
    }
}

impl Default for MorphConf {
    fn default() -> Self {
        Self {
            slope: SlopeConf::default(),
            cone: ConeConf::default(),
            hills: vec![
                HillConf {
                    count: 20,
                    strength: 0.05,
                    radius: 80.0,
                },
                HillConf {
                    count: 5,
                    strength: 0.8,
                    radius: 200.0,
                },
            ],
            normalize: Some(SpanConf { min: 0.0, max: 1.0 }),
        }
    }
}

impl Default for SlopeConf {
    fn default() -> Self {
        Self {
            direction: None,
            strength: 15.0,
        }
    }
}

impl Default for ConeConf {
    fn default() -> Self {
        Self {
            inverted: false,
            strength: 15.0,
        }
    }
}

impl Default for HydrologyConf {
    fn default() -> Self {
        Self {
            rainfall: 0.000089,
            min_slope: 0.01,
            max_fill_iterations: None,
            max_erosion_rate: 0.010,
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> TerrainResult<Self> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> TerrainResult<()> {
        let [x0, y0] = self.bounds.min;
        let [x1, y1] = self.bounds.max;
        if !(x1 > x0 && y1 > y0) {
            return Err(TerrainError::invalid(
                "bounds",
                format!("max ({x1}, {y1}) must exceed min ({x0}, {y0}) on both axes"),
            ));
        }
        if !(self.resolution > 0.0) {
            return Err(TerrainError::invalid("resolution", "must be positive"));
        }
        if !(self.hydrology.rainfall >= 0.0) {
            return Err(TerrainError::invalid("hydrology.rainfall", "must not be negative"));
        }
        if !(self.hydrology.min_slope >= 0.0) {
            return Err(TerrainError::invalid("hydrology.min_slope", "must not be negative"));
        }
        if self.morph.hills.iter().any(|hill| !(hill.radius > 0.0)) {
            return Err(TerrainError::invalid("morph.hills", "every radius must be positive"));
        }
        if let Some(span) = self.morph.normalize {
            if !(span.max >= span.min) {
                return Err(TerrainError::invalid("morph.normalize", "max is below min"));
            }
        }
        Ok(())
    }

    pub fn bounds(&self) -> Rect<f64> {
        let [x0, y0] = self.bounds.min;
        let [x1, y1] = self.bounds.max;
        Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 })
    }

    /// Lattice columns and rows giving roughly `resolution` points per unit area.
    pub fn grid_dimensions(&self) -> (usize, usize) {
        let bounds = self.bounds();
        let step = self.resolution.sqrt();
        let cols = (bounds.width() * step).round().max(1.0) as usize;
        let rows = (bounds.height() * step).round().max(1.0) as usize;
        (cols, rows)
    }
}
