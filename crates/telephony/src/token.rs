//! Short-lived access tokens for the media server API
//!
//! HS256 JWT signed with the API secret, issuer = API key. The grants cover
//! what placing a call needs: administering the room (agent dispatch) and
//! making SIP calls.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::DispatchError;

const SIGNER_IDENTITY: &str = "care-agent-dispatcher";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    pub room_admin: bool,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipGrant {
    pub admin: bool,
    pub call: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    pub sub: String,
    pub nbf: i64,
    pub exp: i64,
    pub video: VideoGrant,
    pub sip: SipGrant,
}

/// Signs access tokens for one API key
#[derive(Clone)]
pub struct TokenSigner {
    api_key: String,
    api_secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("api_key", &self.api_key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ttl,
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    /// Claims for a token scoped to `room`, valid from now for the TTL
    pub fn claims(&self, room: &str) -> AccessClaims {
        let now = Utc::now().timestamp();
        AccessClaims {
            iss: self.api_key.clone(),
            sub: SIGNER_IDENTITY.to_string(),
            nbf: now,
            exp: now + self.ttl.as_secs() as i64,
            video: VideoGrant {
                room_admin: true,
                room: room.to_string(),
            },
            sip: SipGrant {
                admin: true,
                call: true,
            },
        }
    }

    pub fn sign(&self, room: &str) -> Result<String, DispatchError> {
        if !self.has_credentials() {
            return Err(DispatchError::MissingCredentials);
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &self.claims(room),
            &EncodingKey::from_secret(self.api_secret.as_bytes()),
        )?;
        Ok(token)
    }
}
