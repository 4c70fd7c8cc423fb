//! compile_commands.json generation.
//!
//! clangd and other clang tools read a compilation database that lists the
//! exact command used for each source file. The commands here mirror the
//! `cc` rule of the generated build file.

use crate::env::BuildEnv;
use crate::error::Result;
use crate::ninja::write_atomic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// A single entry of compile_commands.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    /// The working directory for compilation.
    pub directory: PathBuf,

    /// The source file path.
    pub file: PathBuf,

    /// The compilation arguments, compiler first.
    pub arguments: Vec<String>,

    /// Object file produced by the command.
    pub output: PathBuf,
}

/// Collection of compile commands, one per object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileCommands {
    commands: Vec<CompileCommand>,
}

impl CompileCommands {
    /// Get all compile commands.
    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    /// Render as a pretty-printed JSON array.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(&self.commands)?;
        json.push('\n');
        Ok(json)
    }
}

impl BuildEnv {
    /// One compile command per registered object, run from `directory`.
    pub fn compile_commands(&self, directory: &Path) -> CompileCommands {
        let vars = self.vars().expanded();
        let lookup = |name: &str| vars.get(name).map(String::as_str).unwrap_or("");
        let builddir = lookup("builddir");

        let commands = self
            .objects()
            .map(|obj| {
                let source = format!("{obj}.c");
                let output = if builddir.is_empty() {
                    format!("{obj}.o")
                } else {
                    format!("{builddir}/{obj}.o")
                };

                let mut arguments: Vec<String> = lookup("cc")
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                arguments.extend([
                    "-MMD".to_string(),
                    "-MT".to_string(),
                    output.clone(),
                    "-MF".to_string(),
                    format!("{output}.d"),
                ]);
                arguments.extend(lookup("cflags").split_whitespace().map(str::to_string));
                arguments.extend([
                    "-c".to_string(),
                    source.clone(),
                    "-o".to_string(),
                    output.clone(),
                ]);

                CompileCommand {
                    directory: directory.to_path_buf(),
                    file: PathBuf::from(source),
                    arguments,
                    output: PathBuf::from(output),
                }
            })
            .collect();

        CompileCommands { commands }
    }
}

/// Write the compilation database for `env` to `path`.
pub fn write_compile_commands(env: &BuildEnv, directory: &Path, path: &Path) -> Result<()> {
    let commands = env.compile_commands(directory);
    write_atomic(path, commands.to_json()?.as_bytes())?;
    info!(
        path = %path.display(),
        entries = commands.commands().len(),
        "wrote compilation database"
    );
    Ok(())
}
