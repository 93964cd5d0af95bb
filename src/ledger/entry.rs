use crate::identity::{verify, PublicKey, Signature, Signer, SigningError};
use crate::ledger::Coin;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 link in the hash chain
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainHash([u8; 32]);

/// Anchor for the first entry of every chain
pub const GENESIS_HASH: ChainHash = ChainHash([0u8; 32]);

impl ChainHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `H(previous ‖ coin)`
    pub fn link(previous: &ChainHash, coin: &Coin) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(previous.0);
        hasher.update(coin.to_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainHash({})", &self.to_hex()[..16])
    }
}

/// A signed, hash-chained transfer record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    coin: Coin,
    chain_hash: ChainHash,
    signature: Signature,
}

impl LedgerEntry {
    /// Chain `coin` onto `previous` and sign the resulting hash
    pub fn sign(
        coin: Coin,
        previous: &ChainHash,
        signer: &dyn Signer,
    ) -> Result<Self, SigningError> {
        let chain_hash = ChainHash::link(previous, &coin);
        let signature = signer.sign(chain_hash.as_bytes())?;
        Ok(Self {
            coin,
            chain_hash,
            signature,
        })
    }

    /// Assemble an entry from arbitrary parts. Nothing is checked here.
    pub fn from_parts(coin: Coin, chain_hash: ChainHash, signature: Signature) -> Self {
        Self {
            coin,
            chain_hash,
            signature,
        }
    }

    pub fn coin(&self) -> &Coin {
        &self.coin
    }

    pub fn chain_hash(&self) -> &ChainHash {
        &self.chain_hash
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Whether this entry's hash links it onto `tip`
    pub fn links_to(&self, tip: &ChainHash) -> bool {
        ChainHash::link(tip, &self.coin) == self.chain_hash
    }

    /// Verify the signature over the chain hash
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        verify(public_key, self.chain_hash.as_bytes(), &self.signature)
    }
}
