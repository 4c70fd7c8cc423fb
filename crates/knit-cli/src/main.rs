use clap::Parser;
use knit_build::{
    sanitizer_flags, write_build_file, write_compile_commands, Manifest, MANIFEST_FILE,
};
use miette::{IntoDiagnostic, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "knit")]
#[command(author, version, about = "Generate a Ninja build file for a small C project")]
struct Cli {
    /// Comma-separated sanitizers to enable, e.g. `address,undefined`
    #[arg(long, visible_alias = "san", value_name = "LIST")]
    sanitizers: Option<String>,

    /// Target manifest (default: knit.toml if present, else the built-in tests)
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Build file to write
    #[arg(short, long, default_value = "build.ninja")]
    output: PathBuf,

    /// Also write compile_commands.json next to the build file
    #[arg(long)]
    compdb: bool,

    /// Print the build file instead of writing it
    #[arg(long, conflicts_with = "compdb")]
    stdout: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let manifest = load_manifest(cli.manifest.as_deref())?;
    let flags = sanitizer_flags(cli.sanitizers.as_deref());
    let vars = manifest.vars().with_sanitizers(&flags);
    let env = manifest.build_env(vars)?;

    if cli.stdout {
        let mut out = std::io::stdout().lock();
        env.write_ninja(&mut out).into_diagnostic()?;
        out.flush().into_diagnostic()?;
        return Ok(());
    }

    write_build_file(&env, &cli.output)?;

    if cli.compdb {
        let directory = std::env::current_dir().into_diagnostic()?;
        let path = compdb_path(&cli.output);
        write_compile_commands(&env, &directory, &path)?;
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn load_manifest(path: Option<&Path>) -> Result<Manifest> {
    if let Some(path) = path {
        info!(path = %path.display(), "loading manifest");
        return Ok(Manifest::from_file(path)?);
    }

    let default = Path::new(MANIFEST_FILE);
    if default.is_file() {
        info!(path = %default.display(), "loading manifest");
        Ok(Manifest::from_file(default)?)
    } else {
        debug!("no manifest found, using built-in targets");
        Ok(Manifest::default_targets())
    }
}

fn compdb_path(output: &Path) -> PathBuf {
    output.with_file_name("compile_commands.json")
}
