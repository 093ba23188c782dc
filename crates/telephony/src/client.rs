//! Call dispatcher
//!
//! Two calls against the media server's Twirp API, in order:
//! 1. `CreateDispatch` puts the care agent into the room with the call
//!    metadata attached.
//! 2. `CreateSIPParticipant` dials the person into the same room over the
//!    outbound trunk.
//!
//! Nothing is retried. A failed step is logged and returned to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use care_agent_config::DispatchConfig;

use crate::request::CallRequest;
use crate::token::TokenSigner;
use crate::DispatchError;

pub const CREATE_DISPATCH_PATH: &str = "/twirp/livekit.AgentDispatchService/CreateDispatch";
pub const CREATE_SIP_PARTICIPANT_PATH: &str = "/twirp/livekit.SIP/CreateSIPParticipant";

/// Map a `ws://` / `wss://` server URL to its HTTP base
pub fn http_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else {
        url.to_string()
    }
}

#[derive(Debug, Serialize)]
struct CreateDispatchRequest<'a> {
    agent_name: &'a str,
    room: &'a str,
    metadata: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateSipParticipantRequest<'a> {
    sip_trunk_id: &'a str,
    sip_call_to: &'a str,
    room_name: &'a str,
    participant_identity: &'a str,
}

/// Agent dispatch as returned by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDispatch {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub room: String,
}

/// Dialed SIP participant as returned by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipParticipant {
    #[serde(default)]
    pub participant_id: String,
    #[serde(default)]
    pub participant_identity: String,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub sip_call_id: String,
}

/// Outcome of a placed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedCall {
    pub dispatch: AgentDispatch,
    pub participant: SipParticipant,
    /// Metadata string handed to the agent
    pub metadata: String,
}

/// Anything that can place a care call
#[async_trait]
pub trait CallPlacer: Send + Sync {
    async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, DispatchError>;
}

/// HTTP client for the media server
pub struct CallDispatcher {
    http: Client,
    base_url: String,
    signer: TokenSigner,
    config: DispatchConfig,
}

impl CallDispatcher {
    pub fn new(config: DispatchConfig) -> Result<Self, DispatchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        let signer = TokenSigner::new(
            config.api_key.clone(),
            config.api_secret.clone(),
            Duration::from_secs(config.token_ttl_seconds),
        );

        Ok(Self {
            http,
            base_url: http_base_url(&config.livekit_url),
            signer,
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    fn validated_trunk(&self) -> Result<&str, DispatchError> {
        match self.config.sip_trunk_id.as_deref() {
            Some(trunk) if self.config.has_valid_trunk() => Ok(trunk),
            other => {
                let shown = other.unwrap_or("<unset>").to_string();
                tracing::error!(
                    sip_trunk_id = %shown,
                    "SIP_OUTBOUND_TRUNK_ID is not set or invalid"
                );
                Err(DispatchError::InvalidTrunk(shown))
            },
        }
    }

    /// Dispatch the agent, then dial the person in
    pub async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, DispatchError> {
        request.validate()?;
        let trunk = self.validated_trunk()?;
        let metadata = request.metadata().to_wire();

        tracing::info!(
            room = %self.config.room_name,
            agent = %self.config.agent_name,
            person_id = %request.person_id,
            reason = %request.reason,
            "Creating agent dispatch"
        );

        let dispatch: AgentDispatch = self
            .post(
                CREATE_DISPATCH_PATH,
                &CreateDispatchRequest {
                    agent_name: &self.config.agent_name,
                    room: &self.config.room_name,
                    metadata: &metadata,
                },
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Error creating agent dispatch");
                metrics::counter!("care_call_failures_total", "stage" => "dispatch").increment(1);
                e
            })?;

        tracing::info!(dispatch_id = %dispatch.id, "Created dispatch");

        let identity = request.participant_identity();
        tracing::info!(
            to = %request.phone_number,
            trunk = %trunk,
            identity = %identity,
            "Dialing via SIP trunk"
        );

        let participant: SipParticipant = self
            .post(
                CREATE_SIP_PARTICIPANT_PATH,
                &CreateSipParticipantRequest {
                    sip_trunk_id: trunk,
                    sip_call_to: &request.phone_number,
                    room_name: &self.config.room_name,
                    participant_identity: &identity,
                },
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Error creating SIP participant");
                metrics::counter!("care_call_failures_total", "stage" => "sip_participant")
                    .increment(1);
                e
            })?;

        tracing::info!(
            participant_id = %participant.participant_id,
            sip_call_id = %participant.sip_call_id,
            "Created SIP participant"
        );
        metrics::counter!("care_calls_placed_total", "reason" => request.reason_label())
            .increment(1);

        Ok(PlacedCall {
            dispatch,
            participant,
            metadata,
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, DispatchError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let token = self.signer.sign(&self.config.room_name)?;

        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DispatchError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| DispatchError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl CallPlacer for CallDispatcher {
    async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, DispatchError> {
        CallDispatcher::place_call(self, request).await
    }
}
