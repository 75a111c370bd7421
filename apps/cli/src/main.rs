//! Linkdrop CLI
//!
//! Turns owned assets into funded, shareable claim links.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use linkdrop_chain::{connect, ChainMode, LedgerClient, MockLedger, Network};
use linkdrop_core::{Address, ClaimOutcome, MIST_PER_SUI};
use linkdrop_distributor::{Distributor, RunEvent};
use linkdrop_logging::init_logging;
use linkdrop_settings::{default_settings_path, Settings};

/// Progress events buffered between the pipeline and stdout
const EVENT_BUFFER: usize = 64;

/// Linkdrop - bulk claim-link generator
#[derive(Parser)]
#[command(name = "linkdrop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, env = "LINKDROP_CONFIG")]
    config: Option<PathBuf>,

    /// Dotenv file supplying variables the environment leaves unset
    #[arg(long, env = "LINKDROP_ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// Flags overriding the settings file and environment
#[derive(Args)]
struct Overrides {
    /// Signer secret key, hex
    #[arg(long, global = true)]
    secret_key: Option<String>,

    /// Type of the assets to distribute
    #[arg(long, global = true)]
    object_type: Option<String>,

    /// Maximum number of assets to process
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// Gas budget per claim transaction (MIST)
    #[arg(long, global = true)]
    gas_budget: Option<u64>,

    /// Native currency bundled into each link (MIST)
    #[arg(long, global = true)]
    tip: Option<u64>,

    /// Gas budget of the funding transaction (MIST)
    #[arg(long, global = true)]
    funding_gas_budget: Option<u64>,

    /// Claim transactions in flight at once
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Network preset (mainnet, testnet, devnet, localnet)
    #[arg(long, global = true)]
    network: Option<Network>,

    /// Full-node JSON-RPC endpoint
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Host the generated links point to
    #[arg(long, global = true)]
    link_host: Option<String>,

    /// Use the in-memory ledger instead of a full node
    #[arg(long, global = true)]
    mock: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, fund and generate claim links
    Generate {
        /// Also write a JSON report of links and failures
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dry run against an in-memory ledger seeded with this many assets
        #[arg(long)]
        mock_assets: Option<usize>,
    },

    /// List the assets a run would distribute (read-only)
    Discover,

    /// Print the signer address
    Address,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;

    match cli.command {
        Commands::Generate { output, mock_assets } => generate(&settings, output, mock_assets).await,
        Commands::Discover => discover(&settings).await,
        Commands::Address => address(&settings),
    }
}

// ============================================================================
// Settings
// ============================================================================

fn load_settings(cli: &Cli) -> Result<Settings> {
    let path = cli.config.clone().unwrap_or_else(default_settings_path);
    let mut settings = Settings::load_from(&path)
        .with_context(|| format!("loading settings from {}", path.display()))?;
    settings
        .apply_env_file(&cli.env_file)
        .with_context(|| format!("reading environment and {}", cli.env_file.display()))?;

    let o = &cli.overrides;
    if let Some(secret) = &o.secret_key {
        settings.set_secret_key(secret.clone());
    }
    if let Some(object_type) = &o.object_type {
        settings.distribution.object_type = object_type.clone();
    }
    if let Some(limit) = o.limit {
        settings.distribution.limit = limit;
    }
    if let Some(gas_budget) = o.gas_budget {
        settings.distribution.gas_budget = gas_budget;
    }
    if let Some(tip) = o.tip {
        settings.distribution.tip_amount = tip;
    }
    if let Some(budget) = o.funding_gas_budget {
        settings.distribution.funding_gas_budget = budget;
    }
    if let Some(concurrency) = o.concurrency {
        settings.distribution.concurrency = concurrency;
    }
    if let Some(network) = o.network {
        settings.network.network = network;
        settings.network.rpc_url = None;
    }
    if let Some(rpc_url) = &o.rpc_url {
        settings.network.rpc_url = Some(rpc_url.clone());
    }
    if let Some(link_host) = &o.link_host {
        settings.distribution.link_host = link_host.clone();
    }
    if o.mock {
        settings.network.mode = ChainMode::Mock;
    }

    Ok(settings)
}

/// Ledger selected by the settings; a seeded mock for dry runs
fn build_ledger(
    settings: &Settings,
    signer: Address,
    mock_assets: Option<usize>,
) -> Result<Arc<dyn LedgerClient>> {
    let config = settings.chain_config();
    if mock_assets.is_none() && !config.is_mock() {
        info!("Using full node at {}", config.rpc_url);
        return connect(config).context("connecting to full node");
    }

    let ledger = MockLedger::new();
    if let Some(count) = mock_assets {
        let d = &settings.distribution;
        let funding = d
            .gas_budget
            .checked_add(d.tip_amount)
            .and_then(|v| v.checked_mul(count as u64))
            .and_then(|v| v.checked_add(d.funding_gas_budget))
            .and_then(|v| v.checked_add(MIST_PER_SUI))
            .context("mock funding overflows u64")?;

        for _ in 0..count {
            ledger.mint_object(signer, &d.object_type);
        }
        ledger.mint_coin(signer, funding);
        info!("Seeded mock ledger with {} asset(s) and {} MIST", count, funding);
    }
    Ok(Arc::new(ledger))
}

// ============================================================================
// Commands
// ============================================================================

fn address(settings: &Settings) -> Result<()> {
    let signer = settings.signer().context("loading signer")?;
    println!("{}", signer.address());
    Ok(())
}

async fn discover(settings: &Settings) -> Result<()> {
    settings.validate().context("invalid settings")?;
    let signer = settings.signer()?;
    let ledger = build_ledger(settings, signer.address(), None)?;

    let distributor = Distributor::new(ledger, signer, settings.distribution_config());
    println!("signer: {}", distributor.signer_address());

    let assets = distributor.discover().await?;
    println!("object count: {}", assets.len());
    for asset in &assets {
        match asset.id() {
            Some(id) => println!("{}", id),
            None => println!("<entry {} without object data>", asset.index),
        }
    }
    Ok(())
}

async fn generate(
    settings: &Settings,
    output: Option<PathBuf>,
    mock_assets: Option<usize>,
) -> Result<()> {
    settings.validate().context("invalid settings")?;
    let signer = settings.signer()?;
    let ledger = build_ledger(settings, signer.address(), mock_assets)?;

    let distributor = Distributor::new(ledger, signer, settings.distribution_config());
    println!("signer: {}", distributor.signer_address());

    // Links are printed the moment their claim lands, not at the end
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let printer = tokio::spawn(print_events(rx));
    let result = distributor.run_with_events(Some(tx)).await;
    printer.await.context("event printer stopped")?;
    let report = result.context("distribution aborted")?;

    info!(
        "{} link(s), {} failure(s) out of {} asset(s)",
        report.links.len(),
        report.failures.len(),
        report.discovered
    );

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}

async fn print_events(mut rx: mpsc::Receiver<RunEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::Discovered(count) => println!("object count: {}", count),
            RunEvent::Funded(count) => println!("coin count: {}", count),
            RunEvent::Outcome(ClaimOutcome::Claimed(link)) => println!("{}", link),
            RunEvent::Outcome(ClaimOutcome::Failed(failure)) => {
                let asset = failure
                    .asset_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                warn!(
                    "No link for asset #{} ({}), funding coin {}: {}",
                    failure.index, asset, failure.funding_coin, failure.reason
                );
            }
        }
    }
}
