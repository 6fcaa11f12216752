//! Resolve one credential from the command line.
//!
//! Usage:
//!   akeyless-resolve --type basic --id /prod/db/admin
//!   akeyless-resolve --type ssh_private_key --id /prod/ssh --properties mid.properties

use akeyless_resolver::{
    CredentialResolver, EnvProperties, HostProperties, LayeredConfig, PropertyCloudIdentity,
    PropertySource, ResolutionRequest,
};
use anyhow::Context;
use clap::Parser;
use rust_common::{HttpConfig, HttpJsonTransport, TracingConfig, init_tracing};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "akeyless-resolve")]
#[command(about = "Resolve a discovery credential from an Akeyless secret", long_about = None)]
struct Args {
    /// Credential type (basic, windows, ssh_private_key, snmpv3, ...)
    #[arg(long = "type")]
    credential_type: String,

    /// Akeyless secret path
    #[arg(long)]
    id: String,

    /// Requesting host
    #[arg(long)]
    mid: Option<String>,

    /// Target system address
    #[arg(long)]
    ip: Option<String>,

    /// Host properties file used as the override layer
    #[arg(long, env = "AKEYLESS_MID_PROPERTIES")]
    properties: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut tracing_config = TracingConfig::default().with_log_level(&args.log_level);
    if args.json_logs {
        tracing_config = tracing_config.with_json_output();
    }
    init_tracing(&tracing_config).context("failed to initialise tracing")?;

    let overrides: Arc<dyn PropertySource> = match &args.properties {
        Some(path) => {
            debug!(path = %path.display(), "Loading host properties");
            Arc::new(HostProperties::load(path)?)
        }
        None => Arc::new(EnvProperties),
    };
    let config = LayeredConfig::new(overrides, Arc::new(EnvProperties));

    let http_config = HttpConfig::default().with_timeout(Duration::from_secs(args.timeout_secs));
    let transport = HttpJsonTransport::new(&http_config).context("failed to build HTTP client")?;
    let cloud_identity = PropertyCloudIdentity::new(Arc::new(EnvProperties));
    let resolver = CredentialResolver::new(config, Arc::new(transport), Arc::new(cloud_identity));

    let request = ResolutionRequest::new(&args.credential_type, &args.id)?
        .with_requester(args.mid, args.ip);
    let fields = resolver.resolve(&request)?;

    println!("{}", serde_json::to_string_pretty(&fields.into_map())?);
    Ok(())
}
