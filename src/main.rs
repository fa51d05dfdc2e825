use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use procvisor::manifest::{self, Directive, Env, Scale};
use procvisor::{Config, ConfigError, Fleet, LogWriter, RuntimeError, Subscribe};

/// Run the process types of a Procfile and merge their output.
#[derive(Parser, Debug)]
#[command(name = "procvisor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the Procfile.
    #[arg(long, value_name = "PATH", default_value = "Procfile")]
    procfile: PathBuf,

    /// Environment file; repeat to layer several, later ones win.
    #[arg(long, value_name = "PATH", default_value = ".env")]
    envfile: Vec<PathBuf>,

    /// Do not load any environment file.
    #[arg(long)]
    no_env: bool,

    /// Print timestamps in UTC.
    #[arg(long)]
    utc: bool,

    /// Number of instances of a process type, as `label:N` or `*:N`.
    #[arg(long, value_name = "LABEL:N")]
    scale: Vec<Directive>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let (message, status) = failure(&e);
            eprintln!("{message}");
            ExitCode::from(status)
        }
    }
}

/// Message and exit status of a failed run.
///
/// Configuration errors are printed as is and exit with 2; anything else gets
/// its context chain and exits with 1.
fn failure(e: &anyhow::Error) -> (String, u8) {
    if is_config(e) {
        (e.to_string(), 2)
    } else {
        (format!("Error: {e:#}"), 1)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn is_config(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ConfigError>().is_some()
        || e.downcast_ref::<RuntimeError>().is_some_and(RuntimeError::is_config)
}

fn run(cli: Cli) -> Result<()> {
    let types = manifest::procfile::load(&cli.procfile)?;
    let layers = if cli.no_env {
        Vec::new()
    } else {
        load_layers(&cli.envfile)?
    };

    let mut scale = Scale::new();
    scale.extend(cli.scale);
    let slots = Fleet::plan(&types, &scale, &layers, &manifest::parent_env())?;

    let cfg = Config {
        utc: cli.utc,
        ..Config::default()
    };
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::stdout(&cfg))];

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start the async runtime")?;
    runtime.block_on(async move {
        Fleet::builder(cfg)
            .with_subscribers(subscribers)
            .build()
            .run(slots)
            .await
    })?;
    Ok(())
}

/// Loads env files in order; a missing file is only a warning.
fn load_layers(paths: &[PathBuf]) -> Result<Vec<Env>, ConfigError> {
    let mut layers = Vec::with_capacity(paths.len());
    for path in paths {
        match manifest::envfile::load(path)? {
            Some(env) => layers.push(env),
            None => warn_missing(path),
        }
    }
    Ok(layers)
}

fn warn_missing(path: &Path) {
    warn!(path = %path.display(), "environment file not found, skipping");
}
