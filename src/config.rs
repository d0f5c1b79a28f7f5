//! Tool configuration file

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::expand::DEFAULT_MAX_DEPTH;
use crate::planner::PlannerOptions;

/// Tool configuration, read from `craft-planner.toml` or built from defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Path to the SQLite catalog
    pub database: PathBuf,
    /// Hard cap on recipe expansion depth
    pub max_depth: usize,
    /// tracing-subscriber filter used when no -v flag is given
    pub log_filter: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("craft_catalog.db"),
            max_depth: DEFAULT_MAX_DEPTH,
            log_filter: "craft_planner=info".to_string(),
        }
    }
}

impl PlannerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn planner_options(&self) -> PlannerOptions {
        PlannerOptions {
            max_depth: self.max_depth,
        }
    }
}
