//! Treasury sweep-and-burn worker entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use treasury_sweeper::{
    api,
    config::Settings,
    rpc::{Ledger, LedgerClient},
    submit,
    swap::{JupiterClient, SwapApi},
    sweep::SweepRunner,
};

#[derive(Parser)]
#[command(name = "sweeper", about = "Treasury sweep-and-burn worker")]
struct Args {
    /// Path to the settings file.
    #[arg(long, default_value = "config/settings.json")]
    config: String,

    /// Run a single sweep, print the result as JSON, and exit instead of
    /// serving the trigger endpoint.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = Arc::new(Settings::load_from_file(&args.config)?);
    // Key/address mismatch is fatal before any network call is made.
    settings.validate()?;
    info!(
        "[SWEEPER] treasury {} -> target mint {}",
        settings.wallet_address, settings.target_mint
    );

    let submitter = submit::default(
        &settings.rpc_url,
        Duration::from_secs(settings.rpc_timeout_secs),
    )?;
    let ledger: Arc<dyn Ledger> = Arc::new(LedgerClient::new(&settings, submitter));
    let swap: Arc<dyn SwapApi> = Arc::new(JupiterClient::new(
        settings.aggregator_url.clone(),
        Duration::from_secs(settings.rpc_timeout_secs),
    )?);
    let runner = Arc::new(SweepRunner::new(
        settings.clone(),
        ledger.clone(),
        swap.clone(),
    ));

    if args.once {
        let result = runner.run().await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("parsing bind_addr {:?}", settings.bind_addr))?;
    let app = api::router(api::AppState {
        settings: settings.clone(),
        runner,
        ledger,
    });

    info!("[SWEEPER] listening on {addr}");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("serving trigger endpoint")?;

    Ok(())
}
