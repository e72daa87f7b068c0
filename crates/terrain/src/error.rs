use dualmesh::MeshError;
use thiserror::Error;

pub type TerrainResult<T> = Result<T, TerrainError>;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("mesh construction failed: {0}")]
    Mesh(#[from] MeshError),

    #[error("could not parse settings: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

impl TerrainError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        TerrainError::InvalidSetting {
            name,
            reason: reason.into(),
        }
    }
}
