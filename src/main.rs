use clap::Parser;
use coinmesh::node::{CoinExchanger, ExchangerBuilder, ExchangerConfig};
use coinmesh::sync::{BroadcastMedium, LocalMedium, MediumConfig};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Run a local mesh of coin exchangers and print the resulting balances
#[derive(Parser, Debug)]
#[command(name = "coinmesh", version, about)]
struct Cli {
    /// Node names, comma separated
    #[arg(long, value_delimiter = ',', default_value = "n1,n2,n3")]
    nodes: Vec<String>,

    /// Transfers as FROM:TO:AMOUNT, applied in order
    #[arg(long = "transfer", value_parser = parse_transfer)]
    transfers: Vec<Transfer>,

    /// Milliseconds to let the mesh settle between transfers
    #[arg(long, default_value_t = 25)]
    settle_ms: u64,

    /// Memo stamped on every coin
    #[arg(long, default_value = "")]
    memo: String,

    /// Per-subscriber packet buffer of the local medium
    #[arg(long, default_value_t = 1024)]
    capacity: usize,
}

#[derive(Clone, Debug)]
struct Transfer {
    from: String,
    to: String,
    amount: i64,
}

fn parse_transfer(s: &str) -> Result<Transfer, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("expected FROM:TO:AMOUNT, got '{}'", s));
    }
    let amount = parts[2]
        .parse::<i64>()
        .map_err(|e| format!("invalid amount '{}': {}", parts[2], e))?;
    Ok(Transfer {
        from: parts[0].to_string(),
        to: parts[1].to_string(),
        amount,
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let medium: Arc<dyn BroadcastMedium> =
        Arc::new(LocalMedium::with_config(MediumConfig::new().with_capacity(cli.capacity))?);
    let config = ExchangerConfig::new().with_default_memo(&cli.memo);

    let mut nodes: Vec<CoinExchanger> = Vec::new();
    for name in &cli.nodes {
        let node = ExchangerBuilder::new(name.as_str())
            .config(config.clone())
            .start(medium.clone())
            .await?;
        nodes.push(node);
    }

    let settle = Duration::from_millis(cli.settle_ms);
    for transfer in &cli.transfers {
        let sender = nodes
            .iter()
            .find(|node| node.name() == transfer.from)
            .ok_or_else(|| format!("unknown sender '{}'", transfer.from))?;
        sender.send_coin(&transfer.to, transfer.amount).await?;
        info!(from = %transfer.from, to = %transfer.to, amount = transfer.amount, "Transfer sent");
        tokio::time::sleep(settle).await;
    }
    tokio::time::sleep(settle).await;

    let mut names: BTreeSet<String> = cli.nodes.iter().cloned().collect();
    for node in &nodes {
        names.extend(node.chain().await.balances().into_keys());
    }

    for node in &nodes {
        let chain = node.chain().await;
        println!("{} (entries: {}, tip: {})", node.name(), chain.len(), chain.tip_hash());
        for name in &names {
            println!("  {:<12} {:>8}", name, chain.balance_of(name));
        }
    }

    if let Some(first) = nodes.first() {
        let reference = first.chain().await;
        for node in nodes.iter().skip(1) {
            if node.chain().await != reference {
                println!("chains diverged: {} != {}", node.name(), first.name());
            }
        }
    }

    for node in &nodes {
        node.shutdown().await;
    }
    Ok(())
}
