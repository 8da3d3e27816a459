//! Pod Doctor CLI
//!
//! A command-line tool for diagnosing Kubernetes pod issues. It analyzes
//! pod status, container logs, events, node health, resource configuration
//! and probes to identify problems and suggest fixes.

mod client;
mod commands;
mod config;
mod output;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{diagnose, scan};
use output::OutputFormat;

/// Pod Doctor CLI
#[derive(Parser)]
#[command(name = "pod-doctor")]
#[command(author, version, about = "Diagnose Kubernetes pod issues")]
#[command(long_about = "pod-doctor is a CLI tool for diagnosing Kubernetes pod issues.

It analyzes pod status, container states, events, logs and node health
to identify problems and provide actionable recommendations.

Examples:
  # Diagnose a specific pod
  pod-doctor diagnose my-pod -n default

  # Scan all pods in a namespace for issues
  pod-doctor scan -n production

  # Scan all namespaces, showing only unhealthy pods
  pod-doctor scan --all-namespaces --unhealthy")]
pub struct Cli {
    /// Path to kubeconfig file (uses default resolution if not specified)
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<String>,

    /// Kubernetes namespace
    #[arg(long, short, global = true)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Diagnose a specific pod
    Diagnose {
        /// Pod name
        pod: String,
    },

    /// Scan pods for issues
    Scan {
        /// Scan all namespaces
        #[arg(long, short = 'A')]
        all_namespaces: bool,

        /// Only show unhealthy pods
        #[arg(long)]
        unhealthy: bool,

        /// Label selector to filter pods
        #[arg(long, short = 'l')]
        selector: Option<String>,

        /// Number of concurrent diagnoses
        #[arg(long, default_value_t = doctor_lib::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        output::print_error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let file_config = config::Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring unreadable config file");
        config::Config::default()
    });

    let namespace = cli
        .namespace
        .or(file_config.default_namespace)
        .unwrap_or_else(|| "default".to_string());
    let format = cli
        .output
        .or_else(|| {
            file_config
                .default_format
                .as_deref()
                .and_then(|value| OutputFormat::from_str(value, true).ok())
        })
        .unwrap_or_default();

    let source = Arc::new(client::KubeSource::new(cli.kubeconfig.as_deref()).await?);

    match cli.command {
        Commands::Diagnose { pod } => diagnose::run(source, &namespace, &pod, format).await,
        Commands::Scan {
            all_namespaces,
            unhealthy,
            selector,
            concurrency,
        } => {
            let args = scan::ScanArgs {
                all_namespaces,
                unhealthy,
                selector,
                concurrency,
            };
            scan::run(source, &namespace, args, format).await
        }
    }
}
