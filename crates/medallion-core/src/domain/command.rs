//! Command model: environment, invocation and captured result.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Variables handed to one external invocation.
///
/// Built once per stage invocation and never changed afterwards; there is no
/// public mutator. Keys and values are `OsString` so ambient variables that
/// are not valid UTF-8 reach the child unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionEnvironment {
    vars: BTreeMap<OsString, OsString>,
}

impl ExecutionEnvironment {
    /// Start from `ambient` and replace only the keys present in `overrides`.
    pub fn with_overrides<A, O, K, V, OK, OV>(ambient: A, overrides: O) -> Self
    where
        A: IntoIterator<Item = (K, V)>,
        O: IntoIterator<Item = (OK, OV)>,
        K: Into<OsString>,
        V: Into<OsString>,
        OK: Into<OsString>,
        OV: Into<OsString>,
    {
        let mut vars: BTreeMap<OsString, OsString> = ambient
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        for (k, v) in overrides {
            vars.insert(k.into(), v.into());
        }
        Self { vars }
    }

    /// Value of `key`, or `None` when unset or not valid UTF-8.
    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&str> {
        self.get_os(key).and_then(OsStr::to_str)
    }

    /// Raw value, including values that are not valid UTF-8.
    pub fn get_os(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    pub fn contains_key(&self, key: impl AsRef<OsStr>) -> bool {
        self.vars.contains_key(key.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsString, &OsString)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// A fully resolved external invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl CommandSpec {
    /// `<program> <command tokens> --project-dir <project_dir>`, run inside `project_dir`.
    pub fn tool(program: &str, command_text: &str, project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let mut args: Vec<String> = command_text.split_whitespace().map(str::to_string).collect();
        args.push("--project-dir".to_string());
        args.push(project_dir.display().to_string());
        Self {
            program: program.to_string(),
            args,
            working_dir: project_dir,
        }
    }

    /// Command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured outcome of one external invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    /// Exit code recorded when the process ended without one (killed by a signal).
    pub const NO_EXIT_CODE: i32 = -1;

    /// 新しい CommandResult を作成
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success() -> Self {
        Self::new(0, "", "")
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::new(exit_code, "", stderr)
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}
