//! Ninja build file emission.

use crate::env::BuildEnv;
use crate::error::{BuildError, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Compile and link rules shared by every generated build file.
pub const RULES: &str = "
rule cc
  command = $cc -MMD -MT $out -MF $out.d $cflags -c $in -o $out
  description = CC $out
  depfile = $out.d
  deps = gcc

rule link
  command = $cc $ldflags -o $out $in
  description = LINK $out

";

impl BuildEnv {
    /// The build file as individual lines, without terminators.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for (name, value) in self.vars().iter() {
            lines.push(format!("{name} = {value}"));
        }

        // Leading and trailing newlines of RULES become blank lines
        lines.extend(RULES.lines().map(str::to_string));

        lines.push("# objects".to_string());
        for obj in self.objects() {
            lines.push(format!("build $builddir/{obj}.o: cc {obj}.c"));
        }

        lines.push(String::new());
        lines.push("# executables".to_string());
        for program in self.programs() {
            let inputs = program
                .objects
                .iter()
                .map(|obj| format!("$builddir/{obj}.o"))
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(format!("build $builddir/{}: link {inputs}", program.name));
        }

        lines
    }

    /// The complete build file text.
    pub fn render(&self) -> String {
        let mut text = String::new();
        for line in self.lines() {
            text.push_str(&line);
            text.push('\n');
        }
        text
    }

    /// Write the build file to `out`. The writer is neither flushed nor closed.
    pub fn write_ninja<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(self.render().as_bytes())
    }
}

/// Write `env` to `path`, replacing any previous file only once the new
/// contents are complete.
pub fn write_build_file(env: &BuildEnv, path: &Path) -> Result<()> {
    write_atomic(path, env.render().as_bytes())?;
    info!(
        path = %path.display(),
        objects = env.objects().count(),
        programs = env.programs().len(),
        "wrote build file"
    );
    Ok(())
}

/// Stage `contents` in a temporary file beside `path`, then rename it into place.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(|e| BuildError::io(dir, e))?;
    staged
        .write_all(contents)
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| BuildError::io(staged.path(), e))?;
    staged
        .as_file()
        .set_permissions(target_permissions(path, staged.as_file())?)
        .map_err(|e| BuildError::io(staged.path(), e))?;
    staged
        .persist(path)
        .map_err(|e| BuildError::io(path, e.error))?;
    Ok(())
}

/// Permissions for the replacement file: those of the file being replaced,
/// or a world-readable default for a new one.
fn target_permissions(path: &Path, staged: &std::fs::File) -> Result<std::fs::Permissions> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let mut perms = staged
                .metadata()
                .map_err(|e| BuildError::io(path, e))?
                .permissions();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                perms.set_mode(0o644);
            }
            #[cfg(not(unix))]
            perms.set_readonly(false);
            Ok(perms)
        }
        Err(e) => Err(BuildError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::{sanitizer_flags, Vars};

    const EXPECTED: &str = "\
builddir = build
cc = clang
cflags = -g -Wall -Wextra -Wpedantic -Werror -Wno-gnu-zero-variadic-macro-arguments -std=c11 -fcolor-diagnostics
ldflags = -L$builddir

rule cc
  command = $cc -MMD -MT $out -MF $out.d $cflags -c $in -o $out
  description = CC $out
  depfile = $out.d
  deps = gcc

rule link
  command = $cc $ldflags -o $out $in
  description = LINK $out

# objects
build $builddir/test_test.o: cc test_test.c
build $builddir/test.o: cc test.c
build $builddir/test_utf_buffer.o: cc test_utf_buffer.c
build $builddir/utf_buffer.o: cc utf_buffer.c

# executables
build $builddir/test/test_test: link $builddir/test_test.o $builddir/test.o
build $builddir/test/test_utf_buffer: link $builddir/test_utf_buffer.o $builddir/utf_buffer.o $builddir/test.o
";

    fn builtin_env(vars: Vars) -> BuildEnv {
        let mut env = BuildEnv::new(vars);
        env.test("test_test", &["test_test.c"]).unwrap();
        env.test("test_utf_buffer", &["test_utf_buffer.c", "utf_buffer.c"])
            .unwrap();
        env
    }

    #[test]
    fn test_render_builtin_targets() {
        let env = builtin_env(Vars::default());
        assert_eq!(env.render(), EXPECTED);
    }

    #[test]
    fn test_render_is_idempotent() {
        let env = builtin_env(Vars::default());
        let mut first = Vec::new();
        let mut second = Vec::new();
        env.write_ninja(&mut first).unwrap();
        env.write_ninja(&mut second).unwrap();

        assert_eq!(first, second);
        assert_eq!(String::from_utf8(first).unwrap(), env.render());
    }

    #[test]
    fn test_lines_match_render() {
        let env = builtin_env(Vars::default());
        let lines = env.lines();

        assert_eq!(lines.join("\n") + "\n", env.render());
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "rule cc");
    }

    #[test]
    fn test_empty_env() {
        let env = BuildEnv::new(Vars::empty());
        assert_eq!(env.render(), format!("{RULES}# objects\n\n# executables\n"));
    }

    #[test]
    fn test_sanitizers_reach_flag_lines() {
        let flags = sanitizer_flags(Some("address,undefined"));
        let env = builtin_env(Vars::default().with_sanitizers(&flags));
        let lines = env.lines();

        assert!(lines[2].ends_with("-fcolor-diagnostics -fsanitize=address -fsanitize=undefined"));
        assert_eq!(
            lines[3],
            "ldflags = -L$builddir -fsanitize=address -fsanitize=undefined"
        );
    }

    #[test]
    fn test_write_build_file_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.ninja");
        std::fs::write(&path, "stale").unwrap();

        let env = builtin_env(Vars::default());
        write_build_file(&env, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), EXPECTED);
        // Only the build file remains; the staging file was renamed
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_build_file_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let env = builtin_env(Vars::default());

        let fresh = dir.path().join("fresh.ninja");
        write_build_file(&env, &fresh).unwrap();
        let mode = std::fs::metadata(&fresh).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);

        let existing = dir.path().join("build.ninja");
        std::fs::write(&existing, "stale").unwrap();
        std::fs::set_permissions(&existing, std::fs::Permissions::from_mode(0o664)).unwrap();
        write_build_file(&env, &existing).unwrap();
        let mode = std::fs::metadata(&existing).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o664);
    }

    #[test]
    fn test_write_build_file_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("build.ninja");

        let env = builtin_env(Vars::default());
        let err = write_build_file(&env, &path).unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }));
        assert!(!path.exists());
    }
}
