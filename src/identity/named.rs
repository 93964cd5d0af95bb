// Identity - a ledger name bound to a freshly generated keypair

use crate::identity::{Keypair, PublicKey, Signature, Signer, SigningError};
use std::fmt;

/// A node's name and the keypair advertised for it.
///
/// Created once at node startup and never changed afterwards.
#[derive(Clone)]
pub struct Identity {
    name: String,
    keypair: Keypair,
}

impl Identity {
    /// Bind `name` to a newly generated keypair
    pub fn generate(name: impl Into<String>) -> Self {
        Self::from_keypair(name, Keypair::generate())
    }

    pub fn from_keypair(name: impl Into<String>, keypair: Keypair) -> Self {
        Self {
            name: name.into(),
            keypair,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }
}

impl Signer for Identity {
    fn sign(&self, message: &[u8]) -> Result<Signature, SigningError> {
        self.keypair.sign(message)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("name", &self.name)
            .field("public_key", &self.public_key())
            .finish()
    }
}
