//! Target manifest (knit.toml format).

use crate::env::{BuildEnv, TEST_HARNESS};
use crate::error::{BuildError, Result};
use crate::vars::Vars;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default manifest file name.
pub const MANIFEST_FILE: &str = "knit.toml";

/// Declarative description of the programs and tests to build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Harness source linked into every test.
    #[serde(default)]
    pub harness: Option<String>,

    /// Variable bindings; the built-in set is used when absent.
    #[serde(default)]
    pub vars: Option<Vars>,

    /// Executables.
    #[serde(rename = "program", default)]
    pub programs: Vec<TargetConfig>,

    /// Test executables, placed under `test/`.
    #[serde(rename = "test", default)]
    pub tests: Vec<TargetConfig>,
}

/// One program or test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub name: String,
    pub sources: Vec<String>,
}

impl TargetConfig {
    pub fn new(name: &str, sources: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Manifest {
    /// Load a manifest from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Self::parse(&content)
    }

    /// Parse a manifest from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(text)?;
        if let Some(vars) = &manifest.vars {
            vars.validate()?;
        }
        Ok(manifest)
    }

    /// The targets used when no manifest is given.
    pub fn default_targets() -> Self {
        Self {
            harness: None,
            vars: None,
            programs: Vec::new(),
            tests: vec![
                TargetConfig::new("test_test", &["test_test.c"]),
                TargetConfig::new("test_utf_buffer", &["test_utf_buffer.c", "utf_buffer.c"]),
            ],
        }
    }

    /// The declared variables, or the defaults.
    pub fn vars(&self) -> Vars {
        self.vars.clone().unwrap_or_default()
    }

    pub fn harness(&self) -> &str {
        self.harness.as_deref().unwrap_or(TEST_HARNESS)
    }

    /// Build an environment from `vars` holding every target of this manifest.
    pub fn build_env(&self, vars: Vars) -> Result<BuildEnv> {
        vars.validate()?;
        let mut env = BuildEnv::new(vars).with_harness(self.harness());
        self.register(&mut env)?;
        Ok(env)
    }

    /// Register programs, then tests, in manifest order.
    pub fn register(&self, env: &mut BuildEnv) -> Result<()> {
        for target in &self.programs {
            env.program(&target.name, &target.sources)?;
        }
        for target in &self.tests {
            env.test(&target.name, &target.sources)?;
        }
        Ok(())
    }
}
