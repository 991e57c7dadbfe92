//! YAML configuration loader.
//!
//! Balls, fielder rosters and engine profiles live in YAML files so they can
//! be tuned without recompiling.
//!
//! ## Directory Structure
//!
//! ```text
//! config/
//! ├── balls/
//! │   └── official.yaml
//! ├── rosters/
//! │   ├── standard.yaml
//! │   └── infield_in.yaml
//! └── profiles/
//!     ├── default.yaml
//!     └── dead_ball.yaml
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::batting::ImpactConfig;
use crate::collision::BounceConfig;
use crate::error::ConfigError;
use crate::field::FieldGeometry;
use crate::forces::BaseballForces;
use crate::pitch::SolverConfig;
use crate::play::{RunnerConfig, Roster};
use crate::types::BallProperties;

/// Every tunable of the engine in one document. Missing sections fall back
/// to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineProfile {
    pub name: String,
    pub field: FieldGeometry,
    pub bounce: BounceConfig,
    pub forces: BaseballForces,
    pub impact: ImpactConfig,
    pub solver: SolverConfig,
    pub runners: RunnerConfig,
}

impl Default for EngineProfile {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            field: FieldGeometry::standard(),
            bounce: BounceConfig::default(),
            forces: BaseballForces::default(),
            impact: ImpactConfig::default(),
            solver: SolverConfig::default(),
            runners: RunnerConfig::default(),
        }
    }
}

/// Loader with configurable base directory.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// The base path should contain `balls/`, `rosters/` and `profiles/`.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Load a ball by name (without .yaml extension).
    ///
    /// # Example
    /// ```ignore
    /// let loader = ConfigLoader::new("config");
    /// let ball = loader.load_ball("official")?;
    /// ```
    pub fn load_ball(&self, name: &str) -> Result<BallProperties, ConfigError> {
        let ball: BallProperties = self.load("balls", name)?;
        positive("mass", ball.mass)?;
        positive("radius", ball.radius)?;
        if ball.drag_coefficient < 0.0 {
            return Err(invalid("drag_coefficient", "must not be negative"));
        }
        Ok(ball)
    }

    pub fn load_roster(&self, name: &str) -> Result<Roster, ConfigError> {
        let roster: Roster = self.load("rosters", name)?;
        if roster.fielders.is_empty() {
            return Err(invalid("fielders", "roster has no fielders"));
        }
        for fielder in &roster.fielders {
            positive(&format!("{}.move_speed", fielder.name), fielder.move_speed)?;
            positive(&format!("{}.throw_speed", fielder.name), fielder.throw_speed)?;
        }
        Ok(roster)
    }

    pub fn load_profile(&self, name: &str) -> Result<EngineProfile, ConfigError> {
        let profile: EngineProfile = self.load("profiles", name)?;
        positive("runners.seconds_per_base", profile.runners.seconds_per_base)?;
        positive("impact.max_impact_distance", profile.impact.max_impact_distance)?;
        if profile.impact.sweet_spot_radius > profile.impact.max_impact_distance {
            return Err(invalid(
                "impact.sweet_spot_radius",
                "larger than max_impact_distance",
            ));
        }
        Ok(profile)
    }

    pub fn list_balls(&self) -> Result<Vec<String>, ConfigError> {
        self.list("balls")
    }

    pub fn list_rosters(&self) -> Result<Vec<String>, ConfigError> {
        self.list("rosters")
    }

    pub fn list_profiles(&self) -> Result<Vec<String>, ConfigError> {
        self.list("profiles")
    }

    fn load<T: DeserializeOwned>(&self, subdir: &str, name: &str) -> Result<T, ConfigError> {
        let path = self.base_path.join(subdir).join(format!("{}.yaml", name));
        if !path.exists() {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        debug!("loading {}", path.display());
        let contents = fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    fn list(&self, subdir: &str) -> Result<Vec<String>, ConfigError> {
        let path = self.base_path.join(subdir);
        if !path.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".yaml") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, &format!("must be positive, got {}", value)))
    }
}

// =============================================================================
// Tests
// =============================================================================
