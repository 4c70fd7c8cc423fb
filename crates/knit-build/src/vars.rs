//! Top-level Ninja variable bindings.

use crate::error::{BuildError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default C compiler flags.
pub const DEFAULT_CFLAGS: &str = "-g -Wall -Wextra -Wpedantic -Werror \
    -Wno-gnu-zero-variadic-macro-arguments -std=c11 -fcolor-diagnostics";

/// Ordered set of `name = value` bindings written at the top of the build file.
///
/// Iteration follows insertion order, which is also the order of the
/// emitted lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vars {
    entries: IndexMap<String, String>,
}

impl Vars {
    /// An empty variable set.
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Add a binding, replacing the value in place if the name exists.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Append `flags` to both `cflags` and `ldflags`.
    ///
    /// Missing variables are created at the end of the set.
    pub fn with_sanitizers(mut self, flags: &str) -> Self {
        if flags.is_empty() {
            return self;
        }
        for name in ["cflags", "ldflags"] {
            self.entries.entry(name.to_string()).or_default().push_str(flags);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that every binding can be written as a single `name = value` line.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in &self.entries {
            let reason = if name.is_empty() {
                Some("name is empty")
            } else if !name.chars().all(|c| is_var_char(c) || c == '.') {
                Some("name may only contain letters, digits, '_', '-' and '.'")
            } else if value.contains(['\n', '\r']) {
                Some("value contains a line break")
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(BuildError::InvalidVar {
                    name: name.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }

    /// Evaluate every binding the way Ninja does for top-level variables:
    /// each value sees only the bindings declared before it.
    pub fn expanded(&self) -> IndexMap<String, String> {
        let mut scope: IndexMap<String, String> = IndexMap::new();
        for (name, value) in &self.entries {
            let evaluated = expand(value, &scope);
            scope.insert(name.clone(), evaluated);
        }
        scope
    }
}

impl Default for Vars {
    fn default() -> Self {
        Vars::empty()
            .with("builddir", "build")
            .with("cc", "clang")
            .with("cflags", DEFAULT_CFLAGS)
            .with("ldflags", "-L$builddir")
    }
}

/// Build the sanitizer flag suffix for a comma-separated list such as
/// `address,undefined`.
pub fn sanitizer_flags(list: Option<&str>) -> String {
    let Some(list) = list else {
        return String::new();
    };

    let mut flags = String::new();
    for name in list.split(',') {
        flags.push_str(" -fsanitize=");
        flags.push_str(name);
    }
    flags
}

/// Substitute `$name` and `${name}` in `value` and resolve the `$$`, `$ `,
/// `$:` and `$` + newline escapes.
///
/// Unknown names expand to nothing.
pub fn expand(value: &str, scope: &IndexMap<String, String>) -> String {
    let lookup = |name: &str| scope.get(name).map(String::as_str).unwrap_or("");
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];

        if let Some(escaped @ ('$' | ' ' | ':')) = tail.chars().next() {
            out.push(escaped);
            rest = &tail[1..];
        } else if let Some(after) = tail.strip_prefix('\n') {
            // Line continuation drops the newline and the next line's indent
            rest = after.trim_start_matches(' ');
        } else if let Some(braced) = tail.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => {
                    out.push_str(lookup(&braced[..end]));
                    rest = &braced[end + 1..];
                }
                None => {
                    // Unterminated reference, keep it literally
                    out.push_str(&rest[pos..]);
                    rest = "";
                }
            }
        } else {
            let end = tail.find(|c: char| !is_var_char(c)).unwrap_or(tail.len());
            if end == 0 {
                out.push('$');
            } else {
                out.push_str(lookup(&tail[..end]));
            }
            rest = &tail[end..];
        }
    }

    out.push_str(rest);
    out
}

fn is_var_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
