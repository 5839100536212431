use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tower_lsp::{LspService, Server};

use phpantom_typearg::config::Config;
use phpantom_typearg::report::{has_errors, render_json, render_text};
use phpantom_typearg::workspace::{collect_php_files, load_files};
use phpantom_typearg::{Backend, Project};

/// Return types inferred from factory arguments (`@returnTypeArg`).
///
/// Without a subcommand, runs the language server on stdin/stdout.
#[derive(Parser)]
#[command(name = "phpantom-typearg", version, about)]
struct Cli {
    /// Configuration file, instead of `.phpantom-typearg.toml` discovery.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the language server on stdin/stdout.
    Serve,
    /// Analyse files and directories and print the results.
    Check {
        /// PHP files or directories to analyse.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn init_logging(default_level: &str) {
    use std::io::IsTerminal;
    use tracing_subscriber::{EnvFilter, fmt};

    let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the LSP stream and the report; logs go to stderr.
    let subscriber = fmt::fmt()
        .with_env_filter(filter)
        .with_ansi(use_ansi)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            // The workspace config is only known after `initialize`; use
            // the explicit one (if any) for the log level.
            let level = match &cli.config {
                Some(path) => Config::load_from_path(path)
                    .with_context(|| format!("loading {}", path.display()))?
                    .log_level,
                None => Config::default().log_level,
            };
            init_logging(&level);
            serve(cli.config).await;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { paths, format } => check(cli.config.as_deref(), &paths, format),
    }
}

async fn serve(config_path: Option<PathBuf>) {
    tracing::info!("starting language server");
    let (service, socket) =
        LspService::new(|client| Backend::new(client).with_config_path(config_path));
    Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
        .serve(service)
        .await;
}

fn check(config_path: Option<&Path>, paths: &[PathBuf], format: Format) -> anyhow::Result<ExitCode> {
    let cwd = std::env::current_dir().context("reading the current directory")?;
    let (config, source) =
        Config::discover(config_path, Some(&cwd)).context("loading configuration")?;
    init_logging(&config.log_level);
    if let Some(source) = &source {
        tracing::debug!(path = %source.display(), "using config");
    }

    let files = collect_php_files(paths, &config.exclude)?;
    let mut project = Project::with_marker(&config.marker);
    load_files(&mut project, &files, |path| path.display().to_string())?;

    let report = project.analyze();
    tracing::info!(
        files = files.len(),
        inferences = report.inferences.len(),
        diagnostics = report.diagnostics.len(),
        "analysis complete"
    );

    match format {
        Format::Text => print!("{}", render_text(&report)),
        Format::Json => println!(
            "{}",
            render_json(&report, &config).context("serializing the report")?
        ),
    }

    Ok(if has_errors(&report, &config) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
