//! Deployment path configuration.
//!
//! Built once at process start and threaded through every component; nothing
//! reads paths from global state.
//!
//! # Environment variables
//!
//! | Variable                   | Default                                 |
//! |----------------------------|-----------------------------------------|
//! | `MEDALLION_BASE_DIR`       | `.`                                     |
//! | `MEDALLION_RAW_DIR`        | `<base>/data/raw`                       |
//! | `MEDALLION_CLEAN_DIR`      | `<base>/data/clean`                     |
//! | `MEDALLION_QUALITY_DIR`    | `<base>/data/quality`                   |
//! | `MEDALLION_PROJECT_DIR`    | `<base>/dbt`                            |
//! | `MEDALLION_PROFILES_DIR`   | `<base>/profiles`                       |
//! | `MEDALLION_WAREHOUSE_PATH` | `<base>/warehouse/medallion.duckdb`     |
//! | `MEDALLION_DBT_BIN`        | `dbt`                                   |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BASE_DIR_VAR: &str = "MEDALLION_BASE_DIR";
pub const RAW_DIR_VAR: &str = "MEDALLION_RAW_DIR";
pub const CLEAN_DIR_VAR: &str = "MEDALLION_CLEAN_DIR";
pub const QUALITY_DIR_VAR: &str = "MEDALLION_QUALITY_DIR";
pub const PROJECT_DIR_VAR: &str = "MEDALLION_PROJECT_DIR";
pub const PROFILES_DIR_VAR: &str = "MEDALLION_PROFILES_DIR";
pub const WAREHOUSE_PATH_VAR: &str = "MEDALLION_WAREHOUSE_PATH";
pub const TOOL_VAR: &str = "MEDALLION_DBT_BIN";

pub const DEFAULT_TOOL: &str = "dbt";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is set but empty")]
    EmptyValue(&'static str),
}

/// Filesystem layout and tool location shared by every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub raw_dir: PathBuf,
    pub clean_dir: PathBuf,
    pub quality_dir: PathBuf,
    /// dbt project; also the working directory of every tool invocation.
    pub project_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub warehouse_path: PathBuf,
    /// Transformation tool executable.
    pub tool: String,
}

impl PipelineConfig {
    /// Default layout under `base`:
    ///
    /// | field | path |
    /// |---|---|
    /// | `raw_dir` | `data/raw` |
    /// | `clean_dir` | `data/clean` |
    /// | `quality_dir` | `data/quality` |
    /// | `project_dir` | `dbt` |
    /// | `profiles_dir` | `profiles` |
    /// | `warehouse_path` | `warehouse/medallion.duckdb` |
    pub fn from_base_dir(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            raw_dir: base.join("data/raw"),
            clean_dir: base.join("data/clean"),
            quality_dir: base.join("data/quality"),
            project_dir: base.join("dbt"),
            profiles_dir: base.join("profiles"),
            warehouse_path: base.join("warehouse/medallion.duckdb"),
            tool: DEFAULT_TOOL.to_string(),
        }
    }

    /// プロセス環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration through `lookup` (variable name → value).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(key) {
                Some(v) if v.trim().is_empty() => Err(ConfigError::EmptyValue(key)),
                other => Ok(other),
            }
        };

        let base = read(BASE_DIR_VAR)?.unwrap_or_else(|| ".".to_string());
        let mut config = Self::from_base_dir(base);

        let overrides: [(&'static str, &mut PathBuf); 6] = [
            (RAW_DIR_VAR, &mut config.raw_dir),
            (CLEAN_DIR_VAR, &mut config.clean_dir),
            (QUALITY_DIR_VAR, &mut config.quality_dir),
            (PROJECT_DIR_VAR, &mut config.project_dir),
            (PROFILES_DIR_VAR, &mut config.profiles_dir),
            (WAREHOUSE_PATH_VAR, &mut config.warehouse_path),
        ];
        for (key, slot) in overrides {
            if let Some(value) = read(key)? {
                *slot = PathBuf::from(value);
            }
        }
        if let Some(tool) = read(TOOL_VAR)? {
            config.tool = tool;
        }
        Ok(config)
    }
}
