//! Channels and the registry that owns them.

mod registry;
mod types;

pub use registry::Registry;
pub use types::{
    AutoSpec, Channel, ChannelId, ChannelSpec, ChannelSummary, Cue, MediaRef, StreamLink,
};
