//! End-to-end call flows: inputs in through a stream, voice commands out
//! through the channel adapter.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use care_agent_agent::care_agent::{
    ESCALATION_LINE_ES, OPENING_GENERAL_EN, OPENING_WEATHER_EN, SPANISH_SWITCH_LINE,
};
use care_agent_agent::{
    CallInput, CallSession, CareAgent, ChannelVoice, EscalationReporter, VoiceCommand,
};
use care_agent_config::AgentConfig;
use care_agent_core::{CareEvent, CareEventKind, ConcernKind, EscalationReason, RecognizerBackend};

#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<CareEvent>>,
}

impl EscalationReporter for RecordingReporter {
    fn report(&self, event: &CareEvent) {
        self.events.lock().push(event.clone());
    }
}

fn config() -> AgentConfig {
    let mut config = AgentConfig::default();
    config.default_lang_pref = "auto".to_string();
    config.history_limit = 20;
    config
}

async fn run_call(inputs: Vec<CallInput>) -> (Vec<VoiceCommand>, Vec<CareEvent>, CareAgent) {
    let (voice, mut commands) = ChannelVoice::channel(64);
    let reporter = Arc::new(RecordingReporter::default());
    let agent = CareAgent::new(Arc::new(voice), reporter.clone(), config())
        .with_session_id("call-test");

    let (input_tx, input_rx) = mpsc::channel(16);
    let session = tokio::spawn(CallSession::new(agent).run(ReceiverStream::new(input_rx)));

    for input in inputs {
        input_tx.send(input).await.unwrap();
    }
    drop(input_tx);

    let agent = session.await.unwrap();
    let events = reporter.events.lock().clone();

    let mut received = Vec::new();
    while let Ok(command) = commands.try_recv() {
        received.push(command);
    }

    (received, events, agent)
}

fn speak(text: &str) -> VoiceCommand {
    VoiceCommand::Speak {
        text: text.to_string(),
    }
}

#[tokio::test]
async fn weather_call_with_spanish_escalation() {
    let (commands, events, agent) = run_call(vec![
        CallInput::Start {
            metadata: "phone=+15550100;reason=weather;langPref=auto;personId=grandma-001;\
                       ts=2026-10-19T08:00:00+00:00"
                .to_string(),
        },
        CallInput::Transcript {
            text: "I'm fine, thanks".to_string(),
        },
        CallInput::Transcript {
            text: "Hola, necesito ayuda".to_string(),
        },
    ])
    .await;

    assert_eq!(
        commands,
        vec![
            speak(OPENING_WEATHER_EN),
            VoiceCommand::GenerateReply,
            VoiceCommand::SetRecognizer {
                backend: RecognizerBackend::Fallback
            },
            speak(SPANISH_SWITCH_LINE),
            speak(ESCALATION_LINE_ES),
        ]
    );

    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].kind,
        CareEventKind::Escalation(EscalationReason::HelpKeywordDetected)
    );
    assert_eq!(events[0].session_id.as_deref(), Some("call-test"));
    assert_eq!(events[0].person_id.as_deref(), Some("grandma-001"));
    assert_eq!(agent.metadata().phone(), Some("+15550100"));
}

#[tokio::test]
async fn medication_call_flags_concerns_silently() {
    let (commands, events, _) = run_call(vec![
        CallInput::Start {
            metadata: "reason=medication".to_string(),
        },
        CallInput::Transcript {
            text: "I'm a bit dizzy *cough*".to_string(),
        },
        CallInput::Transcript {
            text: "*cough*".to_string(),
        },
    ])
    .await;

    assert_eq!(
        commands,
        vec![speak(OPENING_GENERAL_EN), VoiceCommand::GenerateReply]
    );

    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CareEventKind::Concern(ConcernKind::NegativeMood),
            CareEventKind::Concern(ConcernKind::CoughLikeEvent),
        ]
    );
}

#[tokio::test]
async fn long_call_keeps_bounded_history() {
    let mut inputs = vec![CallInput::Start {
        metadata: String::new(),
    }];
    for i in 0..30 {
        inputs.push(CallInput::Transcript {
            text: format!("utterance {}", i),
        });
    }

    let (_, _, agent) = run_call(inputs).await;
    let history = agent.history().entries();
    assert_eq!(history.len(), 20);
    assert_eq!(history.last().map(|(_, t)| t.as_str()), Some("utterance 29"));
}

#[test]
fn voice_commands_serialize_for_the_bridge() {
    let json = serde_json::to_value(VoiceCommand::SetRecognizer {
        backend: RecognizerBackend::Fallback,
    })
    .unwrap();
    assert_eq!(json["command"], "set_recognizer");
    assert_eq!(json["backend"], "fallback");
}
