//! Call session driver
//!
//! Feeds a stream of call inputs into one [`CareAgent`]. A failed utterance is
//! logged and the session keeps going; the session ends when the input
//! stream does.

use futures::{Stream, StreamExt};

use care_agent_core::parse_metadata;

use crate::care_agent::{CareAgent, TurnOutcome};
use crate::AgentError;

/// Input from the media worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallInput {
    /// Session start with the raw dispatch metadata string
    Start { metadata: String },
    /// A final transcript
    Transcript { text: String },
}

/// Result of handling one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStep {
    Opened { opening: &'static str },
    Turn(TurnOutcome),
    /// Duplicate session start, nothing done
    Ignored,
}

/// Drives a [`CareAgent`] for one call
pub struct CallSession {
    agent: CareAgent,
    started: bool,
    failures: usize,
}

impl CallSession {
    pub fn new(agent: CareAgent) -> Self {
        Self {
            agent,
            started: false,
            failures: 0,
        }
    }

    /// Handle one input, propagating voice errors
    pub async fn handle(&mut self, input: CallInput) -> Result<CallStep, AgentError> {
        match input {
            CallInput::Start { metadata } => {
                if self.started {
                    tracing::warn!(
                        session_id = %self.agent.session_id(),
                        "Duplicate session start ignored"
                    );
                    return Ok(CallStep::Ignored);
                }
                self.started = true;
                let opening = self.agent.on_session_start(parse_metadata(&metadata)).await?;
                Ok(CallStep::Opened { opening })
            },
            CallInput::Transcript { text } => {
                if !self.started {
                    tracing::debug!(
                        session_id = %self.agent.session_id(),
                        "Transcript before session start, using default metadata"
                    );
                }
                let outcome = self.agent.on_transcript(&text).await?;
                Ok(CallStep::Turn(outcome))
            },
        }
    }

    /// Consume inputs until the stream ends, then hand the agent back
    pub async fn run<S>(mut self, inputs: S) -> CareAgent
    where
        S: Stream<Item = CallInput>,
    {
        futures::pin_mut!(inputs);

        while let Some(input) = inputs.next().await {
            if let Err(e) = self.handle(input).await {
                self.failures += 1;
                tracing::error!(
                    session_id = %self.agent.session_id(),
                    error = %e,
                    failures = self.failures,
                    "Failed to handle call input"
                );
            }
        }

        tracing::info!(
            session_id = %self.agent.session_id(),
            turns = self.agent.history().len(),
            failures = self.failures,
            "Call session ended"
        );

        self.agent
    }

    pub fn agent(&self) -> &CareAgent {
        &self.agent
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Inputs that failed so far
    pub fn failures(&self) -> usize {
        self.failures
    }
}
