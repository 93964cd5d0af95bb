//! coinmesh - a peer-to-peer, hash-chained coin ledger.
//!
//! Each [`node::CoinExchanger`] owns a name, an Ed25519 keypair and a private
//! [`ledger::BlockChain`]. Transfers are signed, chained onto the sender's tip
//! and pushed over a [`sync::BroadcastMedium`]; every peer validates the hash
//! link and the signature against the key on record before appending.
//! Honest nodes that saw the same entries hold identical chains and balances.

pub mod identity;
pub mod ledger;
pub mod node;
pub mod sync;
