use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rirsync::{
    ArinClient, ReassignError, Reassigner,
    config::{
        ARIN_OTE_URL, GOOGLE_GEOCODE_URL, GoogleConfig, NetboxConfig, RegistryConfig,
        ReassignSettings, parse_origin_ases,
    },
    geocode::GoogleGeocoder,
    ipam::{Ipam, NetboxClient},
};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, rename_all = "kebab-case")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Reg-RWS base URL
    #[arg(long, env = "RIRSYNC_ARIN_URL", value_name = "URL", default_value = ARIN_OTE_URL, global = true)]
    arin_url: String,
    /// Reg-RWS API key
    #[arg(long, env = "RIRSYNC_ARIN_API_KEY", value_name = "KEY", hide_env_values = true, global = true)]
    arin_api_key: Option<String>,
    /// Request timeout in seconds
    #[arg(long, env = "RIRSYNC_TIMEOUT", value_name = "SECS", default_value_t = 30, global = true)]
    timeout: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reassign a prefix, or every prefix of an aggregate, to its tenant
    Reassign(ReassignArgs),
    /// List IPAM aggregates with their RIR handle
    Aggregates(NetboxArgs),
    /// Send a raw Reg-RWS request and print the response
    Request(RequestArgs),
}

#[derive(Args, Debug)]
struct NetboxArgs {
    /// NetBox base URL
    #[arg(long, env = "RIRSYNC_NETBOX_URL", value_name = "URL")]
    netbox_url: String,
    /// NetBox API token
    #[arg(long, env = "RIRSYNC_NETBOX_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    netbox_token: String,
}

#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("target").required(true).args(["prefix_id", "aggregate_id"]))]
struct ReassignArgs {
    #[command(flatten)]
    netbox: NetboxArgs,
    /// IPAM id of a single prefix
    #[arg(long, value_name = "ID")]
    prefix_id: Option<u64>,
    /// IPAM id of an aggregate whose prefixes are all reassigned
    #[arg(long, value_name = "ID")]
    aggregate_id: Option<u64>,
    /// Reassign prefixes that already carry an RIR handle
    #[arg(long)]
    replace_existing: bool,
    /// Org handle the recipient customers are created under
    #[arg(long, env = "RIRSYNC_PARENT_ORG_HANDLE", value_name = "HANDLE")]
    parent_org_handle: String,
    /// Origin ASes announced for reassigned nets (comma separated)
    #[arg(long, env = "RIRSYNC_ORIGIN_ASES", value_name = "ASES", default_value = "")]
    origin_ases: String,
    /// Google Geocoding API key
    #[arg(long, env = "RIRSYNC_GOOGLE_API_KEY", value_name = "KEY", hide_env_values = true)]
    google_api_key: String,
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Resource path, e.g. /net/NET-10-0-0-0-1
    resource: String,
    /// GET, POST, PUT or DELETE
    #[arg(long, default_value = "GET")]
    method: String,
    /// xml, json, html or plain
    #[arg(long, default_value = "xml")]
    accept: String,
    /// File holding the request body
    #[arg(long, value_name = "PATH")]
    body_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timeout = Duration::from_secs(cli.timeout);
    match &cli.command {
        Command::Reassign(args) => reassign(&cli, args, timeout).await,
        Command::Aggregates(args) => aggregates(args, timeout).await,
        Command::Request(args) => request(&cli, args, timeout).await,
    }
}

fn registry(cli: &Cli, timeout: Duration) -> Result<ArinClient> {
    let api_key = cli
        .arin_api_key
        .clone()
        .context("--arin-api-key (or RIRSYNC_ARIN_API_KEY) is required")?;
    let config = RegistryConfig::new(&cli.arin_url, api_key)
        .context("invalid registry configuration")?
        .with_timeout(timeout);
    ArinClient::new(config).context("failed to build registry client")
}

fn netbox(args: &NetboxArgs, timeout: Duration) -> Result<NetboxClient> {
    NetboxClient::new(NetboxConfig {
        base_url: args.netbox_url.clone(),
        token: args.netbox_token.clone(),
        timeout,
    })
    .context("failed to build NetBox client")
}

async fn reassign(cli: &Cli, args: &ReassignArgs, timeout: Duration) -> Result<()> {
    let settings = ReassignSettings::new(
        args.parent_org_handle.clone(),
        &parse_origin_ases(&args.origin_ases),
        args.replace_existing,
    )
    .context("invalid reassignment settings")?;
    let geocoder = GoogleGeocoder::new(GoogleConfig {
        api_key: args.google_api_key.clone(),
        geocode_url: GOOGLE_GEOCODE_URL.to_string(),
        timeout,
    })
    .context("failed to build geocoder")?;
    let reassigner = Reassigner::new(
        netbox(&args.netbox, timeout)?,
        geocoder,
        registry(cli, timeout)?,
        settings,
    );

    if let Some(prefix_id) = args.prefix_id {
        return match reassigner.run_prefix(prefix_id).await {
            Ok(assignment) => {
                println!(
                    "{}\t{}\t{}",
                    assignment.handle,
                    assignment.net_name.unwrap_or_default(),
                    assignment.registration_date.unwrap_or_default()
                );
                Ok(())
            }
            Err(ReassignError::Precondition(reason)) if reason.is_skip() => {
                info!(%reason, "nothing to do");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("reassignment of prefix {prefix_id} failed")),
        };
    }

    let Some(aggregate_id) = args.aggregate_id else {
        bail!("either --prefix-id or --aggregate-id is required");
    };
    let report = reassigner
        .reassign_aggregate(aggregate_id)
        .await
        .with_context(|| format!("reassignment of aggregate {aggregate_id} failed"))?;
    for (prefix, assignment) in &report.reassigned {
        println!("{prefix}\t{}", assignment.handle);
    }
    info!(
        reassigned = report.reassigned.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "aggregate done"
    );
    if !report.is_clean() {
        for (prefix, e) in &report.failed {
            error!(%prefix, error = %e, "failed");
        }
        bail!("{} prefixes failed", report.failed.len());
    }
    Ok(())
}

async fn aggregates(args: &NetboxArgs, timeout: Duration) -> Result<()> {
    let aggregates = netbox(args, timeout)?
        .aggregates()
        .await
        .context("failed to list aggregates")?;
    for aggregate in aggregates {
        let handle = aggregate.custom_fields.handle().unwrap_or("-");
        println!("[{:>4}] {}\t{}", aggregate.id, aggregate.prefix, handle);
        if handle == "-" {
            warn!(aggregate = %aggregate.prefix, "no RIR handle; its prefixes cannot be reassigned");
        }
    }
    Ok(())
}

async fn request(cli: &Cli, args: &RequestArgs, timeout: Duration) -> Result<()> {
    let body = match &args.body_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };
    let text = registry(cli, timeout)?
        .submit_raw(&args.resource, body, &args.method, &args.accept)
        .await
        .with_context(|| format!("{} {} failed", args.method, args.resource))?;
    println!("{text}");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
