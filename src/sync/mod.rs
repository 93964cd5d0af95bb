// Sync module - HOW NODES TALK
// Wire protocol and the broadcast medium entries travel over

mod medium;
mod protocol;

pub use medium::{
    BroadcastMedium, LocalMedium, MediumConfig, MediumError, Subscription, SubscriptionError,
};
pub use protocol::{Envelope, Message, MessageType, ProtocolError};
