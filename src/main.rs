use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use kustomize_deps::{KustomizeManager, ManagerExecutor, PackageFile, PackageManager};
use serde::Serialize;
use tracing::{debug, error};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Print the remote bases and image pins of Kustomization files as JSON.
#[derive(Parser, Debug)]
#[command(name = "kustomize-deps", version)]
struct CliArgs {
    /// Manifest files to scan
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Scan every file, not only kustomization.yaml / .yml
    #[arg(long)]
    all: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct FileReport {
    path: String,
    #[serde(flatten)]
    package_file: PackageFile,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);
    debug!("Arguments: {:?}", args);

    let executor = match ManagerExecutor::new(KustomizeManager) {
        Ok(executor) => executor,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut reports = Vec::new();
    let mut failed = false;

    for path in &args.files {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!(path = %path.display(), "Failed to read file: {e}");
                failed = true;
                continue;
            }
        };

        let display = path.display().to_string();
        let extracted = if args.all {
            executor.manager().extract_package_file(&content)
        } else {
            executor.extract_file(&display, &content)
        };

        if let Some(package_file) = extracted {
            reports.push(FileReport {
                path: display,
                package_file,
            });
        }
    }

    match serde_json::to_string_pretty(&reports) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            error!("Failed to serialize output: {e}");
            return ExitCode::FAILURE;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kustomize_deps={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
