//! Outbound care calls
//!
//! Places a check-in call by asking the media server to dispatch the care
//! agent into a room and then dialing the person into that room over the
//! outbound SIP trunk. Also hosts the weather trigger that decides whether a
//! call should be placed at all.

pub mod client;
pub mod request;
pub mod token;
pub mod weather;

pub use client::{
    http_base_url, AgentDispatch, CallDispatcher, CallPlacer, PlacedCall, SipParticipant,
};
pub use request::CallRequest;
pub use token::{AccessClaims, SipGrant, TokenSigner, VideoGrant};
pub use weather::{AssumeExtreme, WeatherMonitor, WeatherTrigger};

use thiserror::Error;

/// Call dispatch errors
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Invalid call request: {0}")]
    InvalidRequest(String),

    #[error("SIP outbound trunk id is not set or invalid: {0}")]
    InvalidTrunk(String),

    #[error("Missing media server credentials (api key / secret)")]
    MissingCredentials,

    #[error("Access token error: {0}")]
    Token(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl DispatchError {
    /// True for failures on the media server side rather than our own input
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            DispatchError::Network(_) | DispatchError::Api(_) | DispatchError::InvalidResponse(_)
        )
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        DispatchError::Network(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for DispatchError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        DispatchError::Token(err.to_string())
    }
}
