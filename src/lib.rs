use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

pub mod datasets;
pub mod error;
pub mod logging;

pub use datasets::manifest::{ManifestImageIndex, ManifestParams, PLACEHOLDER_LABEL};
pub use datasets::{Dataset, DatasetBuilder};
pub use error::DataError;

/// Parameter structs round-trip through RON, so dataset setups can be
/// stored next to a training run and reloaded.
pub trait Config: Send + Sync {
    fn config(&self) -> Result<String>;
    fn load_config(&mut self, config: &str) -> Result<()>;
}

impl<T: Serialize + DeserializeOwned + Send + Sync> Config for T {
    fn config(&self) -> Result<String> {
        ron::to_string(self).context("Failed to serialize config")
    }
    fn load_config(&mut self, config: &str) -> Result<()> {
        *self = ron::from_str(config).context(format!("Failed to load config {}", config))?;
        Ok(())
    }
}
