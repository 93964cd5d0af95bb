// Broadcast Medium - delivers packets from any node to every other node
//
// The ledger core only needs three things from the network: a place to
// announce (name, key) bindings, a way to push an entry to everyone, and a
// stream of what everyone else pushed. `LocalMedium` provides them in-process
// on top of a tokio broadcast channel, which is FIFO per sender.

use crate::identity::{DirectoryError, KeyDirectory, KeyRegistry, PublicKey};
use crate::sync::protocol::{Envelope, ProtocolError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Errors raised by a broadcast medium
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MediumError {
    #[error("Announcement refused: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Why a subscription yielded no packet
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Subscriber fell behind and skipped {0} packets")]
    Lagged(u64),

    #[error("Medium closed")]
    Closed,
}

/// Configuration for the in-process medium
#[derive(Clone, Debug)]
pub struct MediumConfig {
    /// Packets buffered per subscriber before the slowest one starts lagging
    pub capacity: usize,
}

impl Default for MediumConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

impl MediumConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), MediumError> {
        if self.capacity == 0 {
            return Err(MediumError::InvalidConfig("capacity cannot be 0".to_string()));
        }
        Ok(())
    }
}

/// Receiving end of a medium. Dropping it releases the handle.
pub struct Subscription {
    receiver: broadcast::Receiver<Arc<[u8]>>,
}

impl Subscription {
    pub fn new(receiver: broadcast::Receiver<Arc<[u8]>>) -> Self {
        Self { receiver }
    }

    /// Wait for the next packet
    pub async fn recv(&mut self) -> Result<Arc<[u8]>, SubscriptionError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Lagged(skipped) => SubscriptionError::Lagged(skipped),
            broadcast::error::RecvError::Closed => SubscriptionError::Closed,
        })
    }
}

/// Contract between the ledger core and whatever carries its packets
#[async_trait]
pub trait BroadcastMedium: Send + Sync {
    /// Register `name` with its key and tell everyone about it
    async fn announce(&self, name: &str, public_key: PublicKey) -> Result<(), MediumError>;

    /// Push an envelope to every subscriber. Returns how many received it.
    async fn broadcast(&self, envelope: &Envelope) -> Result<usize, MediumError>;

    /// Start receiving everything broadcast from now on
    fn subscribe(&self) -> Subscription;

    /// Name to key lookup backing signature checks
    fn directory(&self) -> Arc<dyn KeyDirectory>;
}

/// In-process medium shared by every node of a local mesh
pub struct LocalMedium {
    sender: broadcast::Sender<Arc<[u8]>>,
    registry: Arc<KeyRegistry>,
    packets_sent: AtomicU64,
}

impl LocalMedium {
    pub fn new() -> Self {
        Self::build(MediumConfig::default())
    }

    pub fn with_config(config: MediumConfig) -> Result<Self, MediumError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MediumConfig) -> Self {
        let (sender, _) = broadcast::channel(config.capacity);
        Self {
            sender,
            registry: Arc::new(KeyRegistry::new()),
            packets_sent: AtomicU64::new(0),
        }
    }

    /// Push raw bytes, bypassing encoding. Lets callers put arbitrary packets on the wire.
    pub fn broadcast_raw(&self, bytes: &[u8]) -> usize {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(Arc::from(bytes)) {
            Ok(receivers) => receivers,
            Err(_) => {
                warn!(size = bytes.len(), "Packet dropped (no subscribers)");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent.load(Ordering::Relaxed)
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }
}

impl Default for LocalMedium {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BroadcastMedium for LocalMedium {
    async fn announce(&self, name: &str, public_key: PublicKey) -> Result<(), MediumError> {
        self.registry.register(name, public_key.clone())?;
        info!(node = name, key = %public_key, "Identity announced");

        let bytes = Envelope::announce(name, public_key).to_bytes()?;
        self.broadcast_raw(&bytes);
        Ok(())
    }

    async fn broadcast(&self, envelope: &Envelope) -> Result<usize, MediumError> {
        let bytes = envelope.to_bytes()?;
        let receivers = self.broadcast_raw(&bytes);
        debug!(
            origin = envelope.origin(),
            kind = ?envelope.message().message_type(),
            receivers,
            "Packet broadcast"
        );
        Ok(receivers)
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.sender.subscribe())
    }

    fn directory(&self) -> Arc<dyn KeyDirectory> {
        self.registry.clone()
    }
}
