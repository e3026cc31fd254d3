mod command;
mod render;

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use common::{default_config_path, ClientConfig};
use dotenv::dotenv;
use log::{error, info, warn};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use transfer_client::{
    spawn_transfer_watch, spawn_wallet_watch, InventoryReader, RpcInventoryReader, RpcWallet,
    Session, SessionEvent, SessionSettings, TransferDirection, WalletCapability,
};

use crate::command::{Command, HELP};

const RUNNER: &str = "runner";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// path to the client configuration file.
    ///
    /// defaults to `config/client.toml` in the workspace.
    #[arg(long)]
    config: Option<PathBuf>,

    /// overrides the inventory chain endpoint from the config
    #[arg(long)]
    inventory_rpc_url: Option<String>,

    /// overrides the wallet endpoint from the config
    #[arg(long)]
    wallet_rpc_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment variables
    dotenv().ok();

    // initialize the logger
    env_logger::init();

    let cli = Cli::parse();

    let cfg_path = cli.config.unwrap_or_else(default_config_path);
    info!(target: RUNNER, "Using client config: {}", cfg_path.display());

    let mut cfg = ClientConfig::load(&cfg_path)?;
    if let Some(url) = cli.inventory_rpc_url {
        cfg.inventory_rpc_url = url;
    }
    if let Some(url) = cli.wallet_rpc_url {
        cfg.wallet_rpc_url = Some(url);
    }
    cfg.validate()?;

    let settings = SessionSettings::from_config(&cfg)?;
    let inventory_reader: Arc<dyn InventoryReader> =
        Arc::new(RpcInventoryReader::new(&cfg.inventory_rpc_url)?);
    let wallet: Option<Arc<dyn WalletCapability>> = match &cfg.wallet_rpc_url {
        Some(url) => Some(Arc::new(RpcWallet::new(url)?) as Arc<dyn WalletCapability>),
        None => {
            warn!(target: RUNNER, "no wallet endpoint configured");
            None
        }
    };

    let (session, rx) = Session::new(settings.clone(), wallet.clone(), inventory_reader.clone());
    let events = session.sender();
    let mut view = session.subscribe();

    let log_poll = Duration::from_millis(cfg.log_poll_interval_ms);
    for direction in [TransferDirection::Incoming, TransferDirection::Outgoing] {
        spawn_transfer_watch(
            inventory_reader.clone(),
            settings.inventory,
            direction,
            events.clone(),
            log_poll,
            settings.settle_delay,
        );
    }
    if let Some(wallet) = wallet {
        spawn_wallet_watch(
            wallet,
            events.clone(),
            Duration::from_millis(cfg.wallet_poll_interval_ms),
        );
    }

    info!(target: RUNNER, "starting the session");
    let session_handle = tokio::spawn(session.run(rx));

    tokio::spawn(async move {
        while view.changed().await.is_ok() {
            let snapshot = view.borrow_and_update().clone();
            println!("{}", render::render(&snapshot));
        }
    });

    println!("{HELP}");
    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Help) => println!("{HELP}"),
            Ok(command) => {
                let quit = command == Command::Quit;
                if let Some(event) = command.into_event() {
                    if events.send(event).is_err() {
                        error!(target: RUNNER, "session is no longer running");
                        break;
                    }
                }
                if quit {
                    break;
                }
            }
            Err(e) => println!("{e}"),
        }
    }

    // stdin closed without `quit`
    let _ = events.send(SessionEvent::Shutdown);

    match session_handle.await {
        Ok(()) => info!(target: RUNNER, "session stopped"),
        Err(e) => warn!(target: RUNNER, "session task failed: {e:?}"),
    }

    Ok(())
}
