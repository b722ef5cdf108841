use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod constants;
mod contract;
mod crypto;
mod error;
mod indexer;
mod models;
mod provider;
mod services;
mod strategy;
mod utils;

use config::Config;
use error::WalletError;
use models::{DeploymentDescriptor, SessionSnapshot};
use provider::{HttpProvider, WalletProvider};
use services::{BalanceResolver, SessionManager, TransactionHistoryService, Transition};

const MAX_RELOADS: usize = 3;

const USAGE: &str = "usage: eslsca-wallet <command>

commands:
  info                     deployment and contract details
  balance [address]        token balance (defaults to the connected account)
  history [--all]          transaction history, --all for every participant
  transfer <to> <amount>   send tokens
  mint <to> <amount>       mint tokens (contract owner only)
  add-token                ask the wallet to track the token
  watch                    follow account and network changes";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Info,
    Balance(Option<String>),
    History { all: bool },
    Transfer { to: String, amount: String },
    Mint { to: String, amount: String },
    AddToken,
    Watch,
}

impl Command {
    fn parse(args: &[String]) -> Option<Self> {
        let rest = args.get(2..).unwrap_or_default();
        let command = match (args.get(1)?.as_str(), rest) {
            ("info", []) => Command::Info,
            ("balance", []) => Command::Balance(None),
            ("balance", [address]) => Command::Balance(Some(address.clone())),
            ("history", []) => Command::History { all: false },
            ("history", [flag]) if flag == "--all" => Command::History { all: true },
            ("transfer", [to, amount]) => Command::Transfer {
                to: to.clone(),
                amount: amount.clone(),
            },
            ("mint", [to, amount]) => Command::Mint {
                to: to.clone(),
                amount: amount.clone(),
            },
            ("add-token", []) => Command::AddToken,
            ("watch", []) => Command::Watch,
            _ => return None,
        };
        Some(command)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eslsca_wallet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = Command::parse(&args) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;
    tracing::info!("Environment: {}", config.environment);
    if config.is_development() {
        tracing::debug!(
            "Wallet RPC: {}, node RPC: {}",
            config.wallet_rpc_url,
            config.node_rpc_url
        );
    }

    let deployment = DeploymentDescriptor::load(&config.deployment_info_path);
    let wallet = Arc::new(HttpProvider::new("wallet", config.wallet_rpc_url.clone()));
    let node: Arc<dyn WalletProvider> =
        Arc::new(HttpProvider::new("node", config.node_rpc_url.clone()));
    let signer: Arc<dyn WalletProvider> = wallet.clone();
    let manager = SessionManager::new(signer, Some(node), deployment, config.clone());

    if let Err(e) = run(command, &manager, &wallet, &config).await {
        report(&e);
        std::process::exit(1);
    }
    Ok(())
}

fn report(error: &WalletError) {
    let detail = error.detail();
    match serde_json::to_string_pretty(&detail) {
        Ok(rendered) => eprintln!("{rendered}"),
        Err(_) => eprintln!("{}: {}", detail.code, detail.message),
    }
}

/// Connect, reconnecting from scratch whenever the wallet asks for a reload.
async fn establish(manager: &SessionManager) -> error::Result<SessionSnapshot> {
    for _ in 0..MAX_RELOADS {
        match manager.connect().await? {
            Transition::Ready(snapshot) => return Ok(snapshot),
            Transition::ReloadRequired => {
                tracing::info!("Network changed, reconnecting");
            }
        }
    }
    Err(WalletError::Connection(format!(
        "Network did not settle after {} reloads",
        MAX_RELOADS
    )))
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    println!("{}", snapshot.summary());
    if let Some(error) = &snapshot.error {
        println!("error: {error}");
    }
    if let Some(success) = &snapshot.success {
        println!("{success}");
    }
}

async fn run(
    command: Command,
    manager: &SessionManager,
    wallet: &Arc<HttpProvider>,
    config: &Config,
) -> error::Result<()> {
    let snapshot = establish(manager).await?;
    let binding = Arc::clone(snapshot.require_binding()?);
    let account = snapshot.require_account()?;

    match command {
        Command::Info => {
            let deployment = manager.deployment();
            println!("contract:  {}", utils::checksum(&deployment.contract_address));
            println!("owner:     {}", utils::checksum(&deployment.owner_address));
            println!("network:   {}", deployment.network);
            match binding.get_contract_info().await {
                Ok(info) => {
                    println!("name:      {}", info.name);
                    println!("symbol:    {}", info.symbol);
                    println!("supply:    {}", utils::format_amount(info.total_supply));
                    println!("decimals:  {}", info.decimals);
                }
                Err(e) => {
                    tracing::warn!("Could not read contract info: {}", e);
                    println!("name:      {}", deployment.name);
                    println!("symbol:    {}", deployment.symbol);
                    println!("supply:    {}", utils::format_amount(deployment.total_supply));
                    println!("decimals:  {}", deployment.decimals);
                }
            }
            print_snapshot(&snapshot);
        }
        Command::Balance(target) => {
            let target = match target {
                Some(raw) => utils::parse_address(&raw)?,
                None => account,
            };
            let resolved = BalanceResolver::new(manager.deployment())
                .resolve(&binding, target)
                .await;
            println!(
                "{} {} ({})",
                utils::format_amount(resolved.amount),
                snapshot.symbol.as_deref().unwrap_or(constants::TOKEN_SYMBOL),
                resolved.source
            );
        }
        Command::History { all } => {
            let outcome = TransactionHistoryService::new(manager.deployment())
                .load(&binding, account, all || snapshot.is_owner)
                .await;
            if let Some(error) = &outcome.error {
                println!("error: {error}");
            }
            if outcome.records.is_empty() {
                println!("No transactions");
            }
            for record in &outcome.records {
                println!("{}", record.display_line());
            }
        }
        Command::Transfer { to, amount } => {
            let (snapshot, submitted) = manager.transfer(snapshot, &to, &amount).await?;
            println!("{:?} confirmed via {}", submitted.hash, submitted.strategy);
            print_snapshot(&snapshot);
        }
        Command::Mint { to, amount } => {
            let (snapshot, submitted) = manager.mint(snapshot, &to, &amount).await?;
            println!("{:?} confirmed via {}", submitted.hash, submitted.strategy);
            print_snapshot(&snapshot);
        }
        Command::AddToken => {
            let snapshot = manager.register_token(snapshot).await;
            if snapshot.token_registered {
                println!("Token added to wallet");
            } else {
                println!("Wallet did not add the token");
            }
        }
        Command::Watch => watch(manager, wallet, config, snapshot).await,
    }
    Ok(())
}

async fn watch(
    manager: &SessionManager,
    wallet: &Arc<HttpProvider>,
    config: &Config,
    mut snapshot: SessionSnapshot,
) {
    print_snapshot(&snapshot);

    let mut subscription = manager.subscribe();
    let watcher = wallet.watch(config.watch_poll_interval());

    loop {
        tokio::select! {
            event = subscription.next() => {
                let Some(event) = event else { break };
                snapshot = match manager.on_event(event).await {
                    Transition::Ready(next) => next,
                    Transition::ReloadRequired => {
                        establish(manager).await.unwrap_or_else(|e| {
                            tracing::error!("Reconnect failed: {}", e);
                            SessionSnapshot::failed(e.to_string())
                        })
                    }
                };
                print_snapshot(&snapshot);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watch");
                break;
            }
        }
    }

    subscription.unsubscribe();
    watcher.stop();
}
