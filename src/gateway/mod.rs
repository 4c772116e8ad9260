//! Relay implementation

mod builder;
mod relay;

pub use builder::RelayBuilder;
pub use relay::Relay;
