// Polling helpers: peers apply entries asynchronously, so tests wait for
// an observable condition instead of sleeping a fixed amount.

use coinmesh::node::CoinExchanger;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const DEADLINE: Duration = Duration::from_secs(5);
const POLL: Duration = Duration::from_millis(2);

/// Wait until every node's chain holds exactly `len` entries
pub async fn settle(nodes: &[&CoinExchanger], len: usize) {
    let deadline = Instant::now() + DEADLINE;
    loop {
        let mut lens = Vec::with_capacity(nodes.len());
        for node in nodes {
            lens.push(node.chain_len().await);
        }
        if lens.iter().all(|l| *l == len) {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "chains never reached length {}: {:?}",
            len,
            lens
        );
        sleep(POLL).await;
    }
}

/// Wait until `node` has rejected at least `count` inbound entries
pub async fn wait_for_rejections(node: &CoinExchanger, count: u64) {
    let deadline = Instant::now() + DEADLINE;
    while node.stats().entries_rejected < count {
        assert!(
            Instant::now() < deadline,
            "{} rejected {} entries, expected {}",
            node.name(),
            node.stats().entries_rejected,
            count
        );
        sleep(POLL).await;
    }
}

/// Wait until `node` has dropped at least `count` malformed packets
pub async fn wait_for_malformed(node: &CoinExchanger, count: u64) {
    let deadline = Instant::now() + DEADLINE;
    while node.stats().packets_malformed < count {
        assert!(Instant::now() < deadline, "{} never saw malformed packets", node.name());
        sleep(POLL).await;
    }
}

/// Assert every pair of nodes holds the same chain
pub async fn assert_converged(nodes: &[&CoinExchanger]) {
    let reference = nodes[0].chain().await;
    for node in &nodes[1..] {
        let chain = node.chain().await;
        assert_eq!(chain, reference, "{} diverged from {}", node.name(), nodes[0].name());
        assert_eq!(chain.balances(), reference.balances());
    }
}

pub async fn shutdown_all(nodes: &[&CoinExchanger]) {
    for node in nodes {
        node.shutdown().await;
    }
}
