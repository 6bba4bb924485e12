//! size-census CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: load the YAML file and validate it.
//! 2. **Wire observability**: configure `tracing-subscriber` (pretty or JSON on
//!    stderr) and, when an endpoint is given, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: build the [`github::GithubClient`] and
//!    hand it to [`census::run_census`] as both tracker ports.
//! 4. **Render**: print the report to stdout as a table or JSON.
//!
//! Exit codes:
//! - 0: Success (the report may still carry warnings)
//! - 1: Fatal error (configuration, or the board could not be read)

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use github::GithubClient;

mod config;
mod render;
mod telemetry;

use config::Settings;
use render::OutputFormat;
use telemetry::LogFormat;

/// Count issue size labels per engineering function on a GitHub project board.
#[derive(Debug, Parser)]
#[command(name = "size-census", version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// GitHub token; overrides `github.password` in the configuration.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Survey the project board with this exact name instead of the configured one.
    #[arg(long)]
    project: Option<String>,

    /// Report format on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Export traces to this OTLP (gRPC) endpoint.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry =
        match telemetry::init(cli.verbose, cli.log_format, cli.otlp_endpoint.as_deref()) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Error: {e:#}");
                return ExitCode::FAILURE;
            }
        };

    let result = run(&cli).await;
    telemetry.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Census failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::load(&cli.config, cli.token.clone())
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let mut request = settings.census_request();
    if let Some(project) = &cli.project {
        request.project = Some(project.clone());
    }

    let client = GithubClient::new(&settings.github_config()).context("building GitHub client")?;
    let report = census::run_census(&client, &client, &request).await?;

    let output = render::render(&report, cli.format).context("rendering report")?;
    println!("{}", output.trim_end());
    Ok(())
}
