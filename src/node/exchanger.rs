// Coin Exchanger - one ledger node on the broadcast medium
//
// Two activities share the node's chain: callers sending coins and the
// background loop applying what peers broadcast. Both go through a single
// async mutex. `send_coin` holds it from reading the tip until the new entry
// is appended and handed to the medium, so nothing can slip in between and
// every peer sees this node's entries in the order they were chained.

use crate::identity::{Identity, KeyDirectory, Keypair, PublicKey, Signer, SigningError};
use crate::ledger::{BlockChain, ChainError, ChainHash, Coin, LedgerEntry};
use crate::node::config::{ConfigError, ExchangerConfig};
use crate::node::state::NodeState;
use crate::sync::{BroadcastMedium, Envelope, MediumError, Message, Subscription, SubscriptionError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Errors surfaced to callers of a node
#[derive(Error, Debug)]
pub enum ExchangerError {
    #[error("Node is not running")]
    NotRunning,

    #[error("Signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("Entry rejected by the local chain: {0}")]
    Rejected(#[from] ChainError),

    #[error("Medium error: {0}")]
    Medium(#[from] MediumError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Counters describing what a node has sent and received
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExchangerStats {
    pub entries_sent: u64,
    pub entries_accepted: u64,
    pub entries_rejected: u64,
    pub packets_malformed: u64,
    pub packets_lagged: u64,
    pub announcements_seen: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    entries_sent: AtomicU64,
    entries_accepted: AtomicU64,
    entries_rejected: AtomicU64,
    packets_malformed: AtomicU64,
    packets_lagged: AtomicU64,
    announcements_seen: AtomicU64,
}

impl StatsCounters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ExchangerStats {
        ExchangerStats {
            entries_sent: self.entries_sent.load(Ordering::Relaxed),
            entries_accepted: self.entries_accepted.load(Ordering::Relaxed),
            entries_rejected: self.entries_rejected.load(Ordering::Relaxed),
            packets_malformed: self.packets_malformed.load(Ordering::Relaxed),
            packets_lagged: self.packets_lagged.load(Ordering::Relaxed),
            announcements_seen: self.announcements_seen.load(Ordering::Relaxed),
        }
    }
}

/// Builder for a [`CoinExchanger`]
pub struct ExchangerBuilder {
    name: String,
    config: ExchangerConfig,
    keypair: Option<Keypair>,
    signer: Option<Arc<dyn Signer>>,
}

impl ExchangerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: ExchangerConfig::default(),
            keypair: None,
            signer: None,
        }
    }

    pub fn config(mut self, config: ExchangerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this keypair as the node's identity instead of generating one
    pub fn keypair(mut self, keypair: Keypair) -> Self {
        self.keypair = Some(keypair);
        self
    }

    /// Sign outgoing entries with `signer` instead of the identity key.
    /// The identity key is still the one announced for the name.
    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Announce the identity, start the receive loop and return a running node
    pub async fn start(
        self,
        medium: Arc<dyn BroadcastMedium>,
    ) -> Result<CoinExchanger, ExchangerError> {
        self.config.validate()?;

        let identity = Identity::from_keypair(self.name, self.keypair.unwrap_or_else(Keypair::generate));
        let signer: Arc<dyn Signer> = match self.signer {
            Some(signer) => signer,
            None => Arc::new(identity.clone()),
        };

        // Subscribe before announcing so nothing broadcast after startup is missed.
        let subscription = medium.subscribe();
        medium.announce(identity.name(), identity.public_key()).await?;

        let directory = medium.directory();
        let chain = Arc::new(Mutex::new(BlockChain::new()));
        let stats = Arc::new(StatsCounters::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let receiver = ReceiveLoop {
            name: identity.name().to_string(),
            chain: chain.clone(),
            directory: directory.clone(),
            stats: stats.clone(),
            max_message_bytes: self.config.max_message_bytes,
        };
        let task = tokio::spawn(receiver.run(subscription, shutdown_rx));

        info!(node = identity.name(), key = %identity.public_key(), "Node running");

        Ok(CoinExchanger {
            identity,
            config: self.config,
            signer,
            medium,
            directory,
            chain,
            stats,
            state: Mutex::new(NodeState::Running),
            shutdown_tx,
            task: Mutex::new(Some(task)),
        })
    }
}

/// A ledger node: identity, local chain and the loop feeding it
pub struct CoinExchanger {
    identity: Identity,
    config: ExchangerConfig,
    signer: Arc<dyn Signer>,
    medium: Arc<dyn BroadcastMedium>,
    directory: Arc<dyn KeyDirectory>,
    chain: Arc<Mutex<BlockChain>>,
    stats: Arc<StatsCounters>,
    state: Mutex<NodeState>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CoinExchanger {
    /// Start a node named `name` with a fresh keypair and default config
    pub async fn start(
        name: impl Into<String>,
        medium: Arc<dyn BroadcastMedium>,
    ) -> Result<Self, ExchangerError> {
        ExchangerBuilder::new(name).start(medium).await
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn public_key(&self) -> PublicKey {
        self.identity.public_key()
    }

    pub fn config(&self) -> &ExchangerConfig {
        &self.config
    }

    pub async fn state(&self) -> NodeState {
        *self.state.lock().await
    }

    pub fn stats(&self) -> ExchangerStats {
        self.stats.snapshot()
    }

    /// Transfer `amount` from this node to `to`.
    ///
    /// Returns once the entry is on the local chain and handed to the medium;
    /// peers apply it asynchronously.
    pub async fn send_coin(&self, to: &str, amount: i64) -> Result<(), ExchangerError> {
        self.ensure_running().await?;

        let coin = Coin::new(self.name(), to, self.config.default_memo.as_str(), amount);

        let mut chain = self.chain.lock().await;
        let entry = LedgerEntry::sign(coin, &chain.tip_hash(), self.signer.as_ref()).map_err(|e| {
            warn!(node = self.name(), error = %e, "Send aborted: signing failed");
            e
        })?;

        chain
            .append(entry.clone(), self.directory.as_ref())
            .map_err(|e| {
                warn!(node = self.name(), error = %e, "Send aborted: local chain refused entry");
                e
            })?;

        self.medium
            .broadcast(&Envelope::entry(self.name(), entry))
            .await?;
        drop(chain);

        StatsCounters::bump(&self.stats.entries_sent, 1);
        debug!(node = self.name(), to, amount, "Coin sent");
        Ok(())
    }

    /// Broadcast `entry` exactly as given, without applying it locally
    pub async fn relay_entry(&self, entry: LedgerEntry) -> Result<usize, ExchangerError> {
        self.ensure_running().await?;
        let receivers = self
            .medium
            .broadcast(&Envelope::entry(self.name(), entry))
            .await?;
        Ok(receivers)
    }

    pub async fn balance_of(&self, name: &str) -> i64 {
        self.chain.lock().await.balance_of(name)
    }

    /// Snapshot of the local chain
    pub async fn chain(&self) -> BlockChain {
        self.chain.lock().await.clone()
    }

    pub async fn tip_hash(&self) -> ChainHash {
        self.chain.lock().await.tip_hash()
    }

    pub async fn chain_len(&self) -> usize {
        self.chain.lock().await.len()
    }

    /// Stop the receive loop and release the subscription. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.lock().await;
            if !state.can_transition_to(&NodeState::Stopped) {
                return;
            }
            *state = NodeState::Stopped;
        }

        let _ = self.shutdown_tx.send(true);

        if let Some(mut handle) = self.task.lock().await.take() {
            let timeout = Duration::from_millis(self.config.shutdown_timeout_ms);
            if tokio::time::timeout(timeout, &mut handle).await.is_err() {
                warn!(node = self.name(), "Receive loop did not stop in time, aborting");
                handle.abort();
            }
        }

        info!(node = self.name(), "Node stopped");
    }

    async fn ensure_running(&self) -> Result<(), ExchangerError> {
        if self.state.lock().await.is_running() {
            Ok(())
        } else {
            Err(ExchangerError::NotRunning)
        }
    }
}

impl Drop for CoinExchanger {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Background task applying inbound packets to the chain
struct ReceiveLoop {
    name: String,
    chain: Arc<Mutex<BlockChain>>,
    directory: Arc<dyn KeyDirectory>,
    stats: Arc<StatsCounters>,
    max_message_bytes: usize,
}

impl ReceiveLoop {
    async fn run(self, mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => break,

                packet = subscription.recv() => match packet {
                    Ok(bytes) => self.handle_packet(&bytes).await,
                    Err(SubscriptionError::Lagged(skipped)) => {
                        StatsCounters::bump(&self.stats.packets_lagged, skipped);
                        warn!(node = %self.name, skipped, "Receive loop lagging, packets skipped");
                    }
                    Err(SubscriptionError::Closed) => {
                        info!(node = %self.name, "Medium closed");
                        break;
                    }
                },
            }
        }
        debug!(node = %self.name, "Receive loop exited");
    }

    async fn handle_packet(&self, bytes: &[u8]) {
        let envelope = match Envelope::from_bytes(bytes, self.max_message_bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                StatsCounters::bump(&self.stats.packets_malformed, 1);
                warn!(node = %self.name, error = %e, "Dropping malformed packet");
                return;
            }
        };

        if envelope.origin() == self.name {
            return;
        }

        match envelope.into_message() {
            Message::Announce { name, public_key } => {
                StatsCounters::bump(&self.stats.announcements_seen, 1);
                debug!(node = %self.name, peer = %name, key = %public_key, "Peer announced");
            }
            Message::Entry(entry) => {
                let mut chain = self.chain.lock().await;
                match chain.append(entry, self.directory.as_ref()) {
                    Ok(()) => {
                        StatsCounters::bump(&self.stats.entries_accepted, 1);
                    }
                    Err(e) => {
                        StatsCounters::bump(&self.stats.entries_rejected, 1);
                        warn!(node = %self.name, error = %e, "Rejected inbound entry");
                    }
                }
            }
        }
    }
}
