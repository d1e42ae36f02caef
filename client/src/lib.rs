/// CargoLink - client for a peer-to-peer cargo-space marketplace
///
/// A messaging core (conversation polling, notification aggregation,
/// optimistic send with rollback, scroll anchoring) over the marketplace
/// REST backend, plus terminal front-ends.

pub mod composer;
pub mod config;
pub mod error;
pub mod messenger;
pub mod notify;
pub mod poll;
pub mod rest;
pub mod scroll;
pub mod session;
pub mod timefmt;
pub mod types;

pub use config::Config;
pub use error::{ClientError, Result};
pub use messenger::Messenger;
