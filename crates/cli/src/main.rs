//! JVM Diagnostics Collector CLI
//!
//! Collects thread dumps and class histograms from Java processes
//! running in Kubernetes pods and saves them as timestamped files.

mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use jdiag_lib::{
    CollectionOrchestrator, ExecConfig, KubeClient, ProcessHint, ResultWriter, Selector,
    TargetResolver,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Collect JVM thread dumps and class histograms from Kubernetes pods
#[derive(Parser)]
#[command(name = "jdiag")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Kubernetes namespace of the target pods
    #[arg(long, short = 'n', env = "JDIAG_NAMESPACE")]
    pub namespace: String,

    /// Select pods by label selector (e.g. app=webapp)
    #[arg(long)]
    pub label: Option<String>,

    /// Select a single pod by name (takes precedence over --label)
    #[arg(long)]
    pub pod: Option<String>,

    /// Container to exec into (required when a pod has several)
    #[arg(long)]
    pub container: Option<String>,

    /// Substring of the JVM main class, used to pick the process when a
    /// container runs more than one JVM
    #[arg(long)]
    pub main: Option<String>,

    /// Deadline for each remote command, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Directory the diagnostic files are written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Output format for the run summary
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Path to kubeconfig file (uses default if not specified)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<String>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the run summary.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let file_config = config::Config::load().unwrap_or_default();
    let container = cli.container.or(file_config.default_container);
    let hint = cli
        .main
        .or(file_config.default_main_class)
        .map(ProcessHint::new);

    // Selector validation happens before any cluster access.
    let selector = Selector::from_flags(cli.pod, cli.label)?;

    let client = build_client(cli.kubeconfig.as_deref()).await?;
    let cluster = KubeClient::new(client);
    info!(namespace = %cli.namespace, "starting diagnostics collection");

    let orchestrator = CollectionOrchestrator::new(
        &cluster,
        TargetResolver::new(cli.namespace.as_str(), selector, container),
        ResultWriter::new(&cli.output_dir),
        ExecConfig {
            timeout: Duration::from_secs(cli.timeout_secs),
        },
        hint,
    );

    // Dropping the in-flight run on interrupt closes its exec channels;
    // nothing partial reaches disk since writes happen only after a
    // fully captured success.
    let summary = tokio::select! {
        result = orchestrator.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            output::print_error("interrupted, aborting collection");
            return Ok(ExitCode::FAILURE);
        }
    };

    output::print_summary(&summary, cli.format)?;

    Ok(if summary.fully_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Build a cluster client from an explicit kubeconfig path or the
/// default configuration chain (env, ~/.kube/config, in-cluster).
async fn build_client(kubeconfig: Option<&str>) -> Result<kube::Client> {
    let config = match kubeconfig {
        Some(path) => {
            let kubeconfig = kube::config::Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig at {path}"))?;
            kube::Config::from_custom_kubeconfig(
                kubeconfig,
                &kube::config::KubeConfigOptions::default(),
            )
            .await
            .context("Failed to load kubeconfig")?
        }
        None => kube::Config::infer()
            .await
            .context("Failed to infer cluster configuration")?,
    };

    kube::Client::try_from(config).context("Failed to build cluster client")
}
