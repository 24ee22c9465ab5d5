//! Instproxy - device application installer
//!
//! Usage:
//!   instproxy --connect HOST:PORT browse                 # List installed apps
//!   instproxy --connect HOST:PORT --mount DIR install X  # Install an archive
//!   instproxy --connect HOST:PORT uninstall BUNDLE_ID    # Remove an app

mod mount;
mod transport;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use instproxy_core::channel::ReceiveDeadline;
use instproxy_core::client::{InstallKind, InstallationProxyClient};
use instproxy_core::config::{ConfigStore, ProxyConfig};
use instproxy_core::types::{BrowseResult, ClientOptions};

use crate::mount::MountedFileTransfer;
use crate::transport::JsonLinesChannel;

type DeviceClient = InstallationProxyClient<
    JsonLinesChannel<tokio::net::tcp::OwnedReadHalf, tokio::net::tcp::OwnedWriteHalf>,
    MountedFileTransfer,
>;

#[derive(Parser)]
#[command(name = "instproxy")]
#[command(about = "Install, upgrade, list and remove device applications", long_about = None)]
struct Cli {
    /// Address of the installation service relay (HOST:PORT)
    #[arg(long, short)]
    connect: String,

    /// Mount point of the device media filesystem, used to stage archives
    #[arg(long, short)]
    mount: Option<PathBuf>,

    /// Config file (defaults to <config dir>/instproxy/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the remote staging path for archives
    #[arg(long)]
    staging_path: Option<String>,

    /// Output format
    #[arg(short = 'o', long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List installed applications
    #[command(alias = "ls")]
    Browse {
        /// Attribute to return for each application (repeatable)
        #[arg(long = "attribute", value_name = "NAME")]
        attributes: Vec<String>,

        /// Client option forwarded to the device (KEY=VALUE, value may be JSON)
        #[arg(long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },

    /// Install an application archive
    Install(PackageArgs),

    /// Upgrade an installed application from an archive
    Upgrade(PackageArgs),

    /// Uninstall an application by bundle identifier
    #[command(alias = "rm")]
    Uninstall {
        /// Bundle identifier of the application
        bundle_id: String,

        /// Client option forwarded to the device (KEY=VALUE, value may be JSON)
        #[arg(long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },
}

#[derive(Args)]
struct PackageArgs {
    /// Archive file or application directory
    path: PathBuf,

    /// Client option forwarded to the device (KEY=VALUE, value may be JSON)
    #[arg(long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// No output on success
    Quiet,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "instproxy=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let mount = match (&cli.command, cli.mount) {
        (Commands::Install(_) | Commands::Upgrade(_), None) => {
            anyhow::bail!("--mount is required to stage archives for install and upgrade")
        }
        (_, mount) => mount.unwrap_or_default(),
    };

    let channel = JsonLinesChannel::connect(
        &cli.connect,
        ReceiveDeadline::from_config(&config.timeouts),
    )
    .await
    .with_context(|| format!("Failed to connect to {}", cli.connect))?;

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let mut client =
        InstallationProxyClient::from_config(channel, MountedFileTransfer::new(mount), &config)
            .with_cancellation(token);

    match cli.command {
        Commands::Browse {
            attributes,
            options,
        } => {
            let attributes = (!attributes.is_empty()).then_some(attributes);
            let result = client
                .browse(parse_options(&options)?, attributes)
                .await
                .context("Browse failed")?;
            print_browse_result(cli.format, &result)?;
        }
        Commands::Install(args) => {
            run_package(&mut client, InstallKind::Install, args, cli.format).await?;
        }
        Commands::Upgrade(args) => {
            run_package(&mut client, InstallKind::Upgrade, args, cli.format).await?;
        }
        Commands::Uninstall { bundle_id, options } => {
            let options = parse_options(&options)?;
            let mut printer = print_progress;
            let on_progress: Option<&mut (dyn FnMut(u8) + Send)> = if shows_progress(cli.format) {
                Some(&mut printer)
            } else {
                None
            };
            let outcome = client.uninstall(&bundle_id, options, on_progress).await;
            finish_progress(cli.format);
            outcome.with_context(|| format!("Failed to uninstall '{}'", bundle_id))?;
            print_done(cli.format, "uninstall", &bundle_id)?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ProxyConfig> {
    let store = match &cli.config {
        Some(path) => ConfigStore::from_path(path.clone()),
        None => ConfigStore::from_default_location()?,
    };
    let mut config = store.load()?;
    if let Some(staging_path) = &cli.staging_path {
        config.staging_path = staging_path.clone();
        config.validate()?;
    }
    Ok(config)
}

async fn run_package(
    client: &mut DeviceClient,
    kind: InstallKind,
    args: PackageArgs,
    format: OutputFormat,
) -> Result<()> {
    let options = parse_options(&args.options)?;
    let mut printer = print_progress;
    let on_progress: Option<&mut (dyn FnMut(u8) + Send)> = if shows_progress(format) {
        Some(&mut printer)
    } else {
        None
    };
    let outcome = match kind {
        InstallKind::Install => client.install(&args.path, options, on_progress).await,
        InstallKind::Upgrade => client.upgrade(&args.path, options, on_progress).await,
    };
    finish_progress(format);

    let label = kind.command_name().as_str().to_lowercase();
    outcome.with_context(|| format!("Failed to {} {}", label, args.path.display()))?;
    print_done(format, &label, &args.path.display().to_string())
}

fn shows_progress(format: OutputFormat) -> bool {
    matches!(format, OutputFormat::Table)
}

fn print_progress(percent: u8) {
    eprint!("\r{percent:>3}%");
}

fn finish_progress(format: OutputFormat) {
    if shows_progress(format) {
        eprintln!();
    }
}

/// Parse repeated `KEY=VALUE` options. Values that parse as JSON keep their
/// type; anything else is a string.
fn parse_options(pairs: &[String]) -> Result<ClientOptions> {
    let mut options = ClientOptions::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid option '{}': expected KEY=VALUE", pair))?;
        if key.is_empty() {
            anyhow::bail!("Invalid option '{}': empty key", pair);
        }
        let value = serde_json::from_str::<Value>(value)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        options.insert(key, value);
    }
    Ok(options)
}

fn print_browse_result(format: OutputFormat, result: &BrowseResult) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if result.is_empty() {
                println!("No applications reported");
                return Ok(());
            }
            println!("{:<45} {:<30} Version", "Identifier", "Name");
            for entry in result.entries() {
                println!(
                    "{:<45} {:<30} {}",
                    string_field(entry, &["CFBundleIdentifier"]),
                    string_field(entry, &["CFBundleDisplayName", "CFBundleName"]),
                    string_field(entry, &["CFBundleShortVersionString", "CFBundleVersion"]),
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result.entries())?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn print_done(format: OutputFormat, action: &str, target: &str) -> Result<()> {
    match format {
        OutputFormat::Table => println!("✓ {} '{}' complete", action, target),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "action": action,
                "target": target,
                "succeeded": true,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn string_field<'a>(entry: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|key| entry.get(*key).and_then(Value::as_str))
        .unwrap_or("-")
}
