use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gated_door_client::{
    init_tracing, ClientConfig, Driver, GatedDoorClient, Network, SandboxLedger, Scenario,
    Session,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "gated-door", version, about = "Drive the gated door contract")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Network preset (sandbox, testnet, futurenet, mainnet, custom)
    #[arg(long, global = true)]
    network: Option<Network>,

    /// Soroban RPC endpoint, overrides the preset
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a demo scenario (all of them when none is given)
    Run {
        #[arg(value_enum)]
        scenario: Option<Scenario>,

        /// Approval threshold for the multisig scenarios
        #[arg(long)]
        threshold: Option<u32>,

        /// Identity paying for slot storage
        #[arg(long, default_value = "payer")]
        payer: String,
    },
    /// Check the RPC node
    Health,
    /// Look up a submitted transaction
    Status { hash: String },
    /// Submit a signed, base64 encoded transaction envelope
    Submit {
        envelope: PathBuf,

        /// Poll until the transaction is included
        #[arg(long)]
        wait: bool,
    },
    /// Print the instruction layout
    Schema,
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    let mut config = config.with_env_overrides()?;

    if let Some(network) = cli.network {
        if network != config.network {
            config = ClientConfig {
                contract_id: config.contract_id.clone(),
                default_threshold: config.default_threshold,
                ..ClientConfig::new(network)
            };
        }
    }
    if let Some(url) = &cli.rpc_url {
        config.rpc_url = url.clone();
    }
    Ok(config)
}

async fn run_scenarios(
    config: ClientConfig,
    scenario: Option<Scenario>,
    threshold: Option<u32>,
    payer: &str,
) -> anyhow::Result<()> {
    if config.network.is_remote() {
        bail!(
            "scenarios need a signing ledger; {:?} only supports health, status and submit",
            config.network
        );
    }

    let config = match threshold {
        Some(threshold) => config.with_default_threshold(threshold),
        None => config,
    };
    let session = Session::open(Arc::new(config), SandboxLedger::new(), payer).await?;
    let scenarios = match scenario {
        Some(scenario) => vec![scenario],
        None => Scenario::ALL.to_vec(),
    };

    let mut driver = Driver::new(&session);
    for scenario in scenarios {
        let report = driver
            .run(scenario)
            .await
            .with_context(|| format!("scenario {} failed", scenario))?;
        println!("{}\n", report);
    }
    Ok(())
}

fn print_schema() {
    println!("{:<6} {:<20} {:<6} fields", "opcode", "operation", "bytes");
    for spec in gated_door::SCHEMA.iter() {
        let fields: Vec<String> = spec
            .fields
            .iter()
            .map(|kind| format!("{:?}", kind).to_lowercase())
            .collect();
        println!(
            "{:<6} {:<20} {:<6} {}",
            spec.opcode,
            spec.name,
            spec.encoded_len(),
            fields.join(", ")
        );
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Run {
            scenario,
            threshold,
            payer,
        } => run_scenarios(config, scenario, threshold, &payer).await,
        Command::Health => {
            let client = GatedDoorClient::new(Arc::new(config))?;
            let health = client.rpc().get_health().await?;
            let ledger = client.latest_ledger().await?;
            println!(
                "{}: {} (ledger {}, protocol {})",
                client.config().rpc_url,
                health.status,
                ledger.sequence,
                ledger.protocol_version
            );
            if !health.is_healthy() {
                bail!("node reports {}", health.status);
            }
            Ok(())
        }
        Command::Status { hash } => {
            let client = GatedDoorClient::new(Arc::new(config))?;
            println!("{}: {:?}", hash, client.status(&hash).await?);
            Ok(())
        }
        Command::Submit { envelope, wait } => {
            let client = GatedDoorClient::new(Arc::new(config))?;
            let envelope = std::fs::read_to_string(&envelope)
                .with_context(|| format!("reading {}", envelope.display()))?;
            if wait {
                let info = client.submit_and_wait(&envelope).await?;
                println!("{}: {:?} in ledger {:?}", info.hash, info.status, info.ledger);
            } else {
                let sent = client.submit(&envelope).await?;
                println!("{}: {:?}", sent.hash, sent.status);
            }
            Ok(())
        }
        Command::Schema => {
            print_schema();
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(if cli.verbose {
        "gated_door_client=debug"
    } else {
        "gated_door_client=info"
    });

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
