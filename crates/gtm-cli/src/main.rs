//! GTM provisioning CLI
//!
//! Creates a server, an A pool and an A wide-IP on a Global Traffic Manager,
//! or runs one of those steps on its own. Configuration comes from a JSON
//! file or from `GTM_*` environment variables (a `.env` file is honoured).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gtm_api::GtmClient;
use gtm_core::GtmConfig;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gtm")]
#[command(author, version, about = "Provision servers, pools and wide-IPs on a GTM device", long_about = None)]
struct Cli {
    /// JSON configuration file; GTM_* environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Accept any TLS certificate presented by the device
    #[arg(long, global = true)]
    insecure: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Create server, pool and wide-IP in order (default)
    Provision,
    /// Print the GTM servers as JSON
    ListServers,
    /// Create the server and its virtual servers
    CreateServer,
    /// Create the A pool
    CreatePool,
    /// Create the A wide-IP
    CreateWideip,
}

fn load_config(cli: &Cli) -> Result<GtmConfig> {
    let config = match &cli.config {
        Some(path) => GtmConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => {
            match dotenv::dotenv() {
                Ok(path) => debug!("Loaded {}", path.display()),
                Err(e) => debug!("No .env file loaded: {e}"),
            }
            GtmConfig::from_env().context("loading configuration from environment")?
        }
    };

    Ok(if cli.insecure {
        config.with_insecure_skip_tls_verify(true)
    } else {
        config
    })
}

async fn run(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Command::Provision);
    let config = load_config(&cli)?;

    let client = GtmClient::from_config(config).context("building GTM client")?;
    info!(host = %client.host(), ?command, "Starting GTM client");

    match command {
        Command::Provision => {
            let report = client.provision().await.context("provisioning")?;
            info!("Provisioning finished");
            println!("{}", report.pool_response);
            println!("{}", report.wideip_response);
        }
        Command::ListServers => {
            let servers = client.list_servers().await.context("listing servers")?;
            println!("{}", serde_json::to_string_pretty(&servers)?);
        }
        Command::CreateServer => {
            client.create_server().await.context("creating server")?;
            info!(server = %client.deployment().server_name, "Server created");
        }
        Command::CreatePool => {
            println!("{}", client.create_pool().await.context("creating pool")?);
        }
        Command::CreateWideip => {
            println!("{}", client.create_wideip().await.context("creating wide-IP")?);
        }
    }

    Ok(())
}

/// Code of the underlying GTM error, if the failure came from one.
fn failure_code(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<gtm_core::Error>()
        .map_or("UNKNOWN", gtm_core::Error::error_code)
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!(code = failure_code(&err), "{err:#}");
            std::process::ExitCode::FAILURE
        }
    }
}
