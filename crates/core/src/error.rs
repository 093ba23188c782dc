//! Core error types

use thiserror::Error;

/// Result alias used by core traits
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised at the core trait boundaries
#[derive(Error, Debug)]
pub enum Error {
    /// The channel on the other side has gone away
    #[error("Channel closed")]
    ChannelClosed,
}
