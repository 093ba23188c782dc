//! Channel-backed voice adapter
//!
//! [`ChannelVoice`] turns every [`VoiceChannel`] call into a [`VoiceCommand`]
//! on a bounded mpsc queue. Whoever owns the receiver (the server's bridge
//! socket) forwards the commands to the real media worker in order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use care_agent_core::{Error, RecognizerBackend, Result, VoiceChannel};

/// A single instruction for the media worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum VoiceCommand {
    Speak { text: String },
    SetRecognizer { backend: RecognizerBackend },
    GenerateReply,
}

/// [`VoiceChannel`] writing to an mpsc queue
#[derive(Debug, Clone)]
pub struct ChannelVoice {
    tx: mpsc::Sender<VoiceCommand>,
}

impl ChannelVoice {
    pub fn new(tx: mpsc::Sender<VoiceCommand>) -> Self {
        Self { tx }
    }

    /// Create a voice adapter and the receiver its commands arrive on
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<VoiceCommand>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    async fn send(&self, command: VoiceCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::ChannelClosed)
    }
}

#[async_trait]
impl VoiceChannel for ChannelVoice {
    async fn speak(&self, text: &str) -> Result<()> {
        self.send(VoiceCommand::Speak {
            text: text.to_string(),
        })
        .await
    }

    async fn set_recognizer(&self, backend: RecognizerBackend) -> Result<()> {
        self.send(VoiceCommand::SetRecognizer { backend }).await
    }

    async fn generate_reply(&self) -> Result<()> {
        self.send(VoiceCommand::GenerateReply).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commands_arrive_in_order() {
        let (voice, mut rx) = ChannelVoice::channel(8);
        voice.speak("hello").await.unwrap();
        voice.set_recognizer(RecognizerBackend::Fallback).await.unwrap();
        voice.generate_reply().await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(VoiceCommand::Speak {
                text: "hello".to_string()
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(VoiceCommand::SetRecognizer {
                backend: RecognizerBackend::Fallback
            })
        );
        assert_eq!(rx.recv().await, Some(VoiceCommand::GenerateReply));
    }

    #[tokio::test]
    async fn test_closed_receiver() {
        let (voice, rx) = ChannelVoice::channel(1);
        drop(rx);
        assert!(matches!(voice.speak("hi").await, Err(Error::ChannelClosed)));
    }
}
