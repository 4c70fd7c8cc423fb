//! Ninja build file generation for small C projects.
//!
//! This crate provides:
//! - An ordered set of top-level Ninja variables, with sanitizer injection
//! - Target registration with object deduplication (`BuildEnv`)
//! - Build file rendering and atomic writing
//! - A target manifest format (`knit.toml`)
//! - compile_commands.json generation
//!
//! # Example
//!
//! ```toml
//! # knit.toml
//! [vars]
//! builddir = "build"
//! cc = "clang"
//! cflags = "-g -Wall -std=c11"
//! ldflags = "-L$builddir"
//!
//! [[program]]
//! name = "app"
//! sources = ["main.c", "utf_buffer.c"]
//!
//! [[test]]
//! name = "test_utf_buffer"
//! sources = ["test_utf_buffer.c", "utf_buffer.c"]
//! ```

mod compile_commands;
mod config;
mod env;
mod error;
mod ninja;
mod vars;

pub use compile_commands::{write_compile_commands, CompileCommand, CompileCommands};
pub use config::{Manifest, TargetConfig, MANIFEST_FILE};
pub use env::{object_name, BuildEnv, Program, TEST_DIR, TEST_HARNESS};
pub use error::{BuildError, Result};
pub use ninja::{write_build_file, RULES};
pub use vars::{expand, sanitizer_flags, Vars, DEFAULT_CFLAGS};
