//! EnvironmentBuilder - dbt に渡す環境変数の構築

use std::ffi::OsString;

use crate::config::PipelineConfig;
use crate::domain::{ExecutionEnvironment, RunId};

pub const PROFILES_DIR_KEY: &str = "DBT_PROFILES_DIR";
pub const CLEAN_DIR_KEY: &str = "CLEAN_DIR";
pub const RUN_ID_KEY: &str = "DS_NODASH";
pub const WAREHOUSE_PATH_KEY: &str = "DUCKDB_PATH";

/// Derives the per-invocation environment from the ambient one.
///
/// Only the four keys above are overridden; every other ambient variable is
/// carried over untouched.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentBuilder<'a> {
    config: &'a PipelineConfig,
}

impl<'a> EnvironmentBuilder<'a> {
    /// 新しい EnvironmentBuilder を作成
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Build from the live process environment, non-UTF-8 entries included.
    pub fn build(&self, run_id: &RunId) -> ExecutionEnvironment {
        self.build_from(std::env::vars_os(), run_id)
    }

    /// Build from an explicit ambient environment.
    pub fn build_from<I, K, V>(&self, ambient: I, run_id: &RunId) -> ExecutionEnvironment
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        ExecutionEnvironment::with_overrides(ambient, self.overrides(run_id))
    }

    fn overrides(&self, run_id: &RunId) -> [(&'static str, OsString); 4] {
        [
            (PROFILES_DIR_KEY, self.config.profiles_dir.clone().into_os_string()),
            (CLEAN_DIR_KEY, self.config.clean_dir.clone().into_os_string()),
            (RUN_ID_KEY, OsString::from(run_id.as_str())),
            (WAREHOUSE_PATH_KEY, self.config.warehouse_path.clone().into_os_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_id() -> RunId {
        RunId::parse("20251201").unwrap()
    }

    fn ambient(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn contains_the_four_tool_keys() {
        let config = PipelineConfig::from_base_dir("/srv/m");
        let env = EnvironmentBuilder::new(&config).build_from(Vec::<(String, String)>::new(), &run_id());

        assert_eq!(env.get(PROFILES_DIR_KEY), Some("/srv/m/profiles"));
        assert_eq!(env.get(CLEAN_DIR_KEY), Some("/srv/m/data/clean"));
        assert_eq!(env.get(RUN_ID_KEY), Some("20251201"));
        assert_eq!(
            env.get(WAREHOUSE_PATH_KEY),
            Some("/srv/m/warehouse/medallion.duckdb")
        );
        assert_eq!(env.len(), 4);
    }

    #[test]
    fn preserves_unrelated_ambient_variables() {
        let config = PipelineConfig::from_base_dir("/srv/m");
        let ambient = ambient(&[("PATH", "/usr/bin"), ("DBT_TARGET", "prod"), ("HOME", "/root")]);
        let env = EnvironmentBuilder::new(&config).build_from(ambient.clone(), &run_id());

        for (k, v) in &ambient {
            assert_eq!(env.get(k), Some(v.as_str()));
        }
        assert_eq!(env.len(), ambient.len() + 4);
    }

    #[test]
    fn overrides_stale_ambient_values() {
        let config = PipelineConfig::from_base_dir("/srv/m");
        let ambient = ambient(&[(RUN_ID_KEY, "19990101"), (CLEAN_DIR_KEY, "/tmp/elsewhere")]);
        let env = EnvironmentBuilder::new(&config).build_from(ambient, &run_id());

        assert_eq!(env.get(RUN_ID_KEY), Some("20251201"));
        assert_eq!(env.get(CLEAN_DIR_KEY), Some("/srv/m/data/clean"));
    }

    #[test]
    fn live_environment_is_carried_over() {
        let config = PipelineConfig::from_base_dir("/srv/m");
        let env = EnvironmentBuilder::new(&config).build(&run_id());

        if let Ok(path) = std::env::var("PATH") {
            assert_eq!(env.get("PATH"), Some(path.as_str()));
        }
        assert_eq!(env.get(RUN_ID_KEY), Some("20251201"));
    }

    #[cfg(unix)]
    #[test]
    fn keeps_ambient_values_that_are_not_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let config = PipelineConfig::from_base_dir("/srv/m");
        let latin1 = OsStr::from_bytes(b"caf\xe9");
        let ambient = vec![
            (OsString::from("LEGACY_LATIN1"), latin1.to_os_string()),
            (OsString::from("PLAIN"), OsString::from("ok")),
        ];
        let env = EnvironmentBuilder::new(&config).build_from(ambient, &run_id());

        assert_eq!(env.get_os("LEGACY_LATIN1"), Some(latin1));
        assert_eq!(env.get("PLAIN"), Some("ok"));
        assert_eq!(env.len(), 6);
    }
}
