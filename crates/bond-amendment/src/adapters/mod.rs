//! In-process adapters for the outbound ports.

pub mod channel_session;
pub mod event_bus;
pub mod notary;
pub mod vault;

pub use channel_session::{
    spawn_responder, ChannelSessionProvider, ProposalEnvelope, ResponderHandle,
};
pub use event_bus::{BroadcastEventBus, TracingEventSink};
pub use notary::InMemoryNotary;
pub use vault::InMemoryVault;
