// Ledger module - coins, hash-chained entries and the local chain

mod chain;
mod codec;
mod coin;
mod entry;

pub use chain::{BlockChain, ChainError};
pub use codec::{CodecError, EntryCodec};
pub use coin::Coin;
pub use entry::{ChainHash, LedgerEntry, GENESIS_HASH};
