//! Target registration.

use crate::error::{BuildError, Result};
use crate::vars::Vars;
use indexmap::IndexSet;
use tracing::debug;

/// Harness source appended to every test target.
pub const TEST_HARNESS: &str = "test.c";

/// Output namespace for test executables.
pub const TEST_DIR: &str = "test";

/// Object name for a C source file, e.g. `utf_buffer.c` -> `utf_buffer`.
///
/// Returns `None` unless the name has exactly one extension and that
/// extension is `c`.
pub fn object_name(source: &str) -> Option<&str> {
    let mut parts = source.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(stem), Some("c"), None) => Some(stem),
        _ => None,
    }
}

/// Characters that end a path or start an escape in a Ninja build line.
const NINJA_SPECIAL: &[char] = &[' ', ':', '$', '\n', '\r'];

/// Why `path` cannot appear unescaped in a build edge, if it cannot.
fn path_problem(path: &str) -> Option<&'static str> {
    if path.is_empty() {
        Some("name is empty")
    } else if path.contains(NINJA_SPECIAL) {
        Some("contains a space, ':', '$' or line break")
    } else {
        None
    }
}

/// An executable and the objects it links, in link order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub name: String,
    pub objects: Vec<String>,
}

/// Accumulated build targets plus the variables they are built with.
#[derive(Debug, Clone)]
pub struct BuildEnv {
    vars: Vars,
    harness: String,
    programs: Vec<Program>,
    objects: IndexSet<String>,
}

impl BuildEnv {
    pub fn new(vars: Vars) -> Self {
        Self {
            vars,
            harness: TEST_HARNESS.to_string(),
            programs: Vec::new(),
            objects: IndexSet::new(),
        }
    }

    /// Use a different harness source for tests registered from now on.
    pub fn with_harness(mut self, harness: impl Into<String>) -> Self {
        self.harness = harness.into();
        self
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub fn harness(&self) -> &str {
        &self.harness
    }

    /// Registered programs, in registration order.
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// Every distinct object, in first-seen order.
    pub fn objects(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(String::as_str)
    }

    /// Register an executable built from `sources`.
    ///
    /// Nothing is recorded unless every source maps to an object.
    pub fn program<S: AsRef<str>>(&mut self, name: &str, sources: &[S]) -> Result<()> {
        if let Some(reason) = path_problem(name) {
            return Err(BuildError::InvalidTarget {
                name: name.to_string(),
                reason,
            });
        }
        if sources.is_empty() {
            return Err(BuildError::InvalidTarget {
                name: name.to_string(),
                reason: "no source files",
            });
        }
        if self.programs.iter().any(|p| p.name == name) {
            return Err(BuildError::DuplicateTarget(name.to_string()));
        }

        let objects = sources
            .iter()
            .map(|src| {
                let src = src.as_ref();
                object_name(src)
                    .filter(|stem| path_problem(stem).is_none())
                    .map(str::to_string)
                    .ok_or_else(|| BuildError::MalformedSource {
                        target: name.to_string(),
                        source_name: src.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        for obj in &objects {
            if self.objects.insert(obj.clone()) {
                debug!(object = %obj, "new object");
            }
        }

        debug!(program = name, objects = objects.len(), "registered program");
        self.programs.push(Program {
            name: name.to_string(),
            objects,
        });
        Ok(())
    }

    /// Register a test executable under `test/`, linked with the harness.
    pub fn test<S: AsRef<str>>(&mut self, name: &str, sources: &[S]) -> Result<()> {
        if name.is_empty() {
            return Err(BuildError::InvalidTarget {
                name: name.to_string(),
                reason: "name is empty",
            });
        }

        let mut all: Vec<String> = sources.iter().map(|s| s.as_ref().to_string()).collect();
        all.push(self.harness.clone());
        self.program(&format!("{TEST_DIR}/{name}"), &all)
    }
}
