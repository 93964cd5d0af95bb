// BlockChain - the node-local, append-only ledger and its balance view
//
// Acceptance checks run in a fixed order: the hash link first, then the
// sender's registered key, then the signature. Rejected entries leave the
// chain untouched, so later entries built against the real tip still link.

use crate::identity::KeyDirectory;
use crate::ledger::{ChainHash, Coin, LedgerEntry, GENESIS_HASH};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

/// Why an entry was refused by a chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Chain integrity: entry claims {actual} but tip links to {expected}")]
    ChainIntegrity {
        expected: ChainHash,
        actual: ChainHash,
    },

    #[error("Unknown sender: no key registered for '{0}'")]
    UnknownSender(String),

    #[error("Invalid signature from '{0}'")]
    InvalidSignature(String),
}

/// Ordered history of accepted entries plus the balances they imply
#[derive(Clone, Debug, Default)]
pub struct BlockChain {
    entries: Vec<LedgerEntry>,
    /// Running totals, kept equal to a full replay of `entries`
    balances: HashMap<String, i64>,
}

impl BlockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&LedgerEntry> {
        self.entries.get(index)
    }

    /// Hash of the last accepted entry, or [`GENESIS_HASH`] when empty
    pub fn tip_hash(&self) -> ChainHash {
        self.entries
            .last()
            .map(|entry| *entry.chain_hash())
            .unwrap_or(GENESIS_HASH)
    }

    /// Validate `entry` against the current tip and append it
    pub fn append(
        &mut self,
        entry: LedgerEntry,
        directory: &dyn KeyDirectory,
    ) -> Result<(), ChainError> {
        let tip = self.tip_hash();
        let expected = ChainHash::link(&tip, entry.coin());
        if expected != *entry.chain_hash() {
            return Err(ChainError::ChainIntegrity {
                expected,
                actual: *entry.chain_hash(),
            });
        }

        let sender = entry.coin().from();
        let public_key = directory
            .public_key_of(sender)
            .ok_or_else(|| ChainError::UnknownSender(sender.to_string()))?;

        if !entry.verify(&public_key) {
            return Err(ChainError::InvalidSignature(sender.to_string()));
        }

        Self::apply(&mut self.balances, entry.coin());
        debug!(
            index = self.entries.len(),
            from = entry.coin().from(),
            to = entry.coin().to(),
            amount = entry.coin().amount(),
            hash = %entry.chain_hash(),
            "Entry appended"
        );
        self.entries.push(entry);

        Ok(())
    }

    /// Boolean form of [`BlockChain::append`]
    pub fn try_append(&mut self, entry: LedgerEntry, directory: &dyn KeyDirectory) -> bool {
        self.append(entry, directory).is_ok()
    }

    /// Balance for `name`, 0 if it never appeared
    pub fn balance_of(&self, name: &str) -> i64 {
        self.balances.get(name).copied().unwrap_or(0)
    }

    /// Recompute the balance for `name` by replaying every entry
    pub fn replay_balance_of(&self, name: &str) -> i64 {
        self.replay_prefix(self.entries.len())
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Balances after replaying the first `len` entries
    pub fn replay_prefix(&self, len: usize) -> HashMap<String, i64> {
        let mut balances = HashMap::new();
        for entry in self.entries.iter().take(len) {
            Self::apply(&mut balances, entry.coin());
        }
        balances
    }

    /// Snapshot of every referenced name's balance, sorted by name
    pub fn balances(&self) -> BTreeMap<String, i64> {
        self.balances
            .iter()
            .map(|(name, amount)| (name.clone(), *amount))
            .collect()
    }

    // i64 overflow wraps in both the running and the replayed totals.
    fn apply(balances: &mut HashMap<String, i64>, coin: &Coin) {
        let from = balances.entry(coin.from().to_string()).or_insert(0);
        *from = from.wrapping_sub(coin.amount());
        let to = balances.entry(coin.to().to_string()).or_insert(0);
        *to = to.wrapping_add(coin.amount());
    }
}

impl PartialEq for BlockChain {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for BlockChain {}
