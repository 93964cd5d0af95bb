// Protocol - what crosses the broadcast medium
//
// - Announce: a node's (name, public key) binding at join time
// - Entry: a signed ledger entry pushed to every peer

use crate::identity::PublicKey;
use crate::ledger::LedgerEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed")]
    DeserializationFailed,

    #[error("Message too large: {size} bytes exceeds limit of {limit}")]
    MessageTooLarge { size: usize, limit: usize },
}

/// Types of messages in the protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Announce,
    Entry,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Announce { name: String, public_key: PublicKey },
    Entry(LedgerEntry),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Announce { .. } => MessageType::Announce,
            Message::Entry(_) => MessageType::Entry,
        }
    }
}

/// A message tagged with the name of the node that put it on the medium
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    origin: String,
    message: Message,
}

impl Envelope {
    pub fn new(origin: impl Into<String>, message: Message) -> Self {
        Self {
            origin: origin.into(),
            message,
        }
    }

    pub fn announce(name: &str, public_key: PublicKey) -> Self {
        Self::new(
            name,
            Message::Announce {
                name: name.to_string(),
                public_key,
            },
        )
    }

    pub fn entry(origin: &str, entry: LedgerEntry) -> Self {
        Self::new(origin, Message::Entry(entry))
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn into_message(self) -> Message {
        self.message
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        postcard::to_allocvec(self).map_err(|e| ProtocolError::SerializationFailed(e.to_string()))
    }

    /// Decode, refusing anything over `limit` bytes before parsing it
    pub fn from_bytes(bytes: &[u8], limit: usize) -> Result<Self, ProtocolError> {
        if bytes.len() > limit {
            return Err(ProtocolError::MessageTooLarge {
                size: bytes.len(),
                limit,
            });
        }
        postcard::from_bytes(bytes).map_err(|_| ProtocolError::DeserializationFailed)
    }
}
