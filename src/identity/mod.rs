// Identity module - names, Ed25519 keypairs, signing and the key directory

mod keypair;
mod named;
mod registry;
mod signer;

pub use keypair::*;
pub use named::*;
pub use registry::*;
pub use signer::*;
