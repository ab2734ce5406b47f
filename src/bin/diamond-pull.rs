//! Pull configuration once and print the merged result as JSON.
//!
//! Usage: `diamond-pull [CONFIG_PATH] [-v|-vv|-vvv]`

use std::process::ExitCode;

use anyhow::Context;
use diamond_pull::DiamondClient;
use tracing::{info, subscriber, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

struct Args {
    config_path: Option<String>,
    verbose: u8,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        config_path: None,
        verbose: 0,
    };

    for arg in std::env::args().skip(1) {
        let verbosity = arg
            .strip_prefix('-')
            .filter(|flags| !flags.is_empty() && flags.chars().all(|c| c == 'v'));

        if let Some(flags) = verbosity {
            args.verbose = args.verbose.saturating_add(flags.len().min(3) as u8);
        } else if arg.starts_with('-') {
            anyhow::bail!("unknown option '{arg}'");
        } else if args.config_path.is_none() {
            args.config_path = Some(arg);
        } else {
            anyhow::bail!("unexpected argument '{arg}'");
        }
    }

    Ok(args)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Usage: diamond-pull [CONFIG_PATH] [-v|-vv|-vvv]");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let client = match &args.config_path {
        Some(path) => DiamondClient::with_config_path(path)?,
        None => DiamondClient::new()?,
    };

    let config = client.config();
    info!(
        endpoint = %config.endpoint,
        namespace = %config.namespace,
        data_id = %config.data_id,
        groups = config.group_names().len(),
        "Pulling configuration"
    );

    let merged = client.pull().await?;
    let output = serde_json::to_string_pretty(&merged).context("Failed to encode result")?;
    println!("{output}");

    Ok(())
}

fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG takes precedence over -v flags
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    subscriber::set_global_default(subscriber)?;

    Ok(())
}
