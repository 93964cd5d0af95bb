use crate::identity::keypair::FixedBytesVisitor;
use crate::identity::{Keypair, PublicKey};
use ed25519_dalek::{Signature as DalekSignature, Signer as DalekSigner, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Invalid signature length: expected 64, got {0}")]
    InvalidLength(usize),
}

/// A local signing operation failed. Aborts the send that requested it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("Signing primitive failed: {0}")]
    Crypto(String),

    #[error("Signer unavailable: {0}")]
    Unavailable(String),
}

/// Ed25519 signature (64 bytes)
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    inner: DalekSignature,
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.inner.to_bytes())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = deserializer.deserialize_bytes(FixedBytesVisitor::<64>)?;
        Ok(Self {
            inner: DalekSignature::from_bytes(&bytes),
        })
    }
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }

    /// Create a signature from raw bytes. Any 64 bytes parse; validity is decided at verify time.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let bytes_array: [u8; 64] = bytes
            .try_into()
            .map_err(|_| SignatureError::InvalidLength(bytes.len()))?;
        Ok(Self {
            inner: DalekSignature::from_bytes(&bytes_array),
        })
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.to_bytes()[..8]))
    }
}

/// Signing capability a node depends on.
///
/// Production nodes sign with their own identity keypair; tests inject
/// doubles (a foreign key, a signer that always fails) behind the same trait.
pub trait Signer: Send + Sync {
    fn sign(&self, message: &[u8]) -> Result<Signature, SigningError>;
}

impl Signer for Keypair {
    fn sign(&self, message: &[u8]) -> Result<Signature, SigningError> {
        self.signing_key()
            .try_sign(message)
            .map(|inner| Signature { inner })
            .map_err(|e| SigningError::Crypto(e.to_string()))
    }
}

/// Verify a signature against a public key and message
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    public_key.inner().verify(message, &signature.inner).is_ok()
}
