//! graphlink - inspect and check configured SDK connections

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use graphlink::{DylibRegistry, RegistryConfig, RegistryError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "graphlink")]
#[command(about = "Inspect and check graph API SDK connections")]
#[command(version)]
struct Cli {
    /// JSON configuration file (default configuration if omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory containing the SDK library, overrides the configuration
    #[arg(long)]
    sdk_lib_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List configured connections and their option names
    List,
    /// Load the SDK and construct a client for each connection
    Check {
        /// Only check this connection
        #[arg(long)]
        key: Option<String>,
    },
}

#[derive(Serialize)]
struct ConnectionSummary<'a> {
    key: &'a str,
    options: Vec<&'a str>,
}

#[derive(Serialize)]
struct CheckReport {
    sdk_entry: Option<PathBuf>,
    loaded: bool,
    connections: BTreeMap<String, CheckResult>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum CheckResult {
    Ok,
    Failed { error: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::EnvFilter::new(&cli.log_level))
        .init();

    let mut config = match &cli.config {
        Some(path) => RegistryConfig::from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => RegistryConfig::default(),
    };
    if let Some(sdk_lib_path) = cli.sdk_lib_path {
        config.sdk_lib_path = Some(sdk_lib_path);
    }

    let registry = DylibRegistry::from_config(config);

    match cli.command {
        Command::List => list(&registry),
        Command::Check { key } => check(&registry, key.as_deref()),
    }
}

fn list(registry: &DylibRegistry) -> Result<()> {
    let summaries: Vec<ConnectionSummary<'_>> = registry
        .connection_keys()
        .into_iter()
        .filter_map(|key| {
            registry.connection(key).map(|connection| ConnectionSummary {
                key,
                options: connection.options.keys().map(String::as_str).collect(),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}

fn check(registry: &DylibRegistry, key: Option<&str>) -> Result<()> {
    let keys: Vec<&str> = match key {
        Some(key) => vec![key],
        None => registry.connection_keys(),
    };

    let initialized = registry.initialize();
    if let Err(e) = &initialized {
        error!("SDK failed to load: {}", e);
    }

    let mut connections = BTreeMap::new();
    let mut failures = 0;
    for key in keys {
        let result = match initialized.as_ref().map_err(ToString::to_string) {
            Err(e) => CheckResult::Failed { error: e },
            Ok(_) => match registry.create_client(key) {
                Ok(_) => {
                    info!("Connection '{}' ok", key);
                    CheckResult::Ok
                }
                Err(e) => {
                    error!("Connection '{}' failed: {}", key, e);
                    CheckResult::Failed {
                        error: error_chain(&e),
                    }
                }
            },
        };
        if matches!(result, CheckResult::Failed { .. }) {
            failures += 1;
        }
        connections.insert(key.to_string(), result);
    }

    let report = CheckReport {
        sdk_entry: registry.loader().entry_path(),
        loaded: registry.is_loaded(),
        connections,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if failures > 0 {
        anyhow::bail!("{} connection(s) failed", failures);
    }
    Ok(())
}

fn error_chain(error: &RegistryError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = std::error::Error::source(cause);
    }
    message
}
