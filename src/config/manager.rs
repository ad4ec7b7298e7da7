use super::{
    evolution::EvolutionConfig, learner::LearnerConfig, representation::RepresentationConfig,
    traits::ConfigSection, update::UpdateConfig,
};
use crate::error::LcsError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix of environment overrides, e.g. `MLSLCS__LEARNER__POPULATION_SIZE=800`.
pub const ENV_PREFIX: &str = "MLSLCS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LcsConfig {
    pub learner: LearnerConfig,
    pub update: UpdateConfig,
    pub evolution: EvolutionConfig,
    pub representation: RepresentationConfig,
}

impl LcsConfig {
    pub fn validate(&self) -> Result<(), LcsError> {
        self.learner.validate()?;
        self.update.validate()?;
        self.evolution.validate()?;
        self.representation.validate()?;
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, LcsError> {
        let config: LcsConfig = toml::from_str(contents)
            .map_err(|e| LcsError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<LcsConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(LcsConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LcsError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LcsError::Configuration(format!("Failed to read config: {}", e)))?;

        let config = LcsConfig::from_toml_str(&contents)?;
        self.replace(config)
    }

    /// Defaults, then the TOML file, then `MLSLCS__*` environment variables.
    pub fn load_layered<P: AsRef<Path>>(&self, path: P) -> Result<(), LcsError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&LcsConfig::default())?)
            .add_source(config::File::from(path.as_ref()).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: LcsConfig = settings.try_deserialize()?;
        config.validate()?;
        self.replace(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LcsError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| LcsError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| LcsError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> LcsConfig {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Applies `f` to a copy and keeps it only if it still validates.
    pub fn update<F>(&self, f: F) -> Result<(), LcsError>
    where
        F: FnOnce(&mut LcsConfig),
    {
        let mut candidate = self.get();
        f(&mut candidate);
        candidate.validate()?;
        self.replace(candidate)
    }

    fn replace(&self, config: LcsConfig) -> Result<(), LcsError> {
        let mut guard = self
            .config
            .write()
            .map_err(|_| LcsError::Configuration("Config lock poisoned".to_string()))?;
        *guard = config;
        Ok(())
    }
}
