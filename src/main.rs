//! orthograph CLI: ingest text files and inspect the orthotopes found.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use orthograph::config::Settings;
use orthograph::engine::Engine;

#[derive(Parser)]
#[command(name = "orthograph", version, about = "Orthotope discovery over ingested text")]
struct Cli {
    /// Settings file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads, overriding the settings file.
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Seconds to wait for the engine to settle.
    #[arg(long, global = true, default_value = "300")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest files (title = file name) and print statistics.
    Ingest {
        /// Text files to ingest, in order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print statistics as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Ingest files and print every orthotope of the given dims.
    Splat {
        /// Comma-separated dims, e.g. "1,1" or "2,1".
        #[arg(long)]
        dims: String,

        /// Text files to ingest, in order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the effective settings as TOML.
    Config {
        /// Also write them to this file.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::resolve(cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        settings.engine.workers = workers;
        settings.engine.validate()?;
    }
    let timeout = Duration::from_secs(cli.timeout);

    match cli.command {
        Commands::Ingest { files, json } => {
            let engine = Engine::new(settings.engine)?;
            ingest(&engine, &files, timeout)?;
            if json {
                let info = serde_json::to_string_pretty(&engine.info()).into_diagnostic()?;
                println!("{info}");
            } else {
                print!("{}", engine.info());
            }
        }

        Commands::Splat { dims, files } => {
            let engine = Engine::new(settings.engine)?;
            ingest(&engine, &files, timeout)?;
            let dump = engine.splat(&dims)?;
            if dump.is_empty() {
                eprintln!("no orthotopes with dims {dims}");
            } else {
                println!("{dump}");
            }
        }

        Commands::Config { path } => {
            if let Some(path) = path {
                settings.save(&path)?;
                eprintln!("settings written to {}", path.display());
            }
            print!("{}", toml::to_string_pretty(&settings).into_diagnostic()?);
        }
    }

    Ok(())
}

/// Add each file in order, then wait for the engine to settle.
fn ingest(engine: &Engine, files: &[PathBuf], timeout: Duration) -> Result<()> {
    for file in files {
        let body = std::fs::read_to_string(file)
            .into_diagnostic()
            .map_err(|e| e.wrap_err(format!("failed to read {}", file.display())))?;
        let admission = engine.add(&title_of(file), &body)?;
        if !admission.new_phrase {
            eprintln!("{}: already ingested", admission.title);
        }
    }
    if !engine.wait_idle(timeout) {
        miette::bail!(
            "engine did not settle within {}s ({} tasks pending)",
            timeout.as_secs(),
            engine.pending_task_count()
        );
    }
    Ok(())
}

fn title_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
