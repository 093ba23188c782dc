//! Escalation reporting
//!
//! Escalations and concerns are handed to an [`EscalationReporter`] as soon
//! as a policy raises them. The shipped reporter logs and counts; paging a
//! family member or care team plugs in behind the same trait.

use care_agent_core::{CareEvent, CareEventKind};

/// Sink for escalation and concern events
pub trait EscalationReporter: Send + Sync {
    /// Called synchronously, once per event, before the policy speaks
    fn report(&self, event: &CareEvent);
}

/// Reporter that writes each event to the tracing log and bumps Prometheus
/// counters (`care_escalations_total{reason}`, `care_concerns_total{kind}`)
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl TracingReporter {
    pub fn new() -> Self {
        Self
    }
}

impl EscalationReporter for TracingReporter {
    fn report(&self, event: &CareEvent) {
        let session_id = event.session_id.as_deref().unwrap_or("-");
        let person_id = event.person_id.as_deref().unwrap_or("-");

        match event.kind {
            CareEventKind::Escalation(reason) => {
                tracing::info!(
                    reason = reason.as_str(),
                    last_heard = %event.last_heard,
                    session_id = %session_id,
                    person_id = %person_id,
                    "Escalation triggered"
                );
                metrics::counter!("care_escalations_total", "reason" => reason.as_str())
                    .increment(1);
            },
            CareEventKind::Concern(kind) => {
                tracing::info!(
                    kind = kind.as_str(),
                    last_heard = %event.last_heard,
                    session_id = %session_id,
                    person_id = %person_id,
                    "Concern flagged"
                );
                metrics::counter!("care_concerns_total", "kind" => kind.as_str()).increment(1);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_agent_core::{ConcernKind, EscalationReason};

    #[test]
    fn test_tracing_reporter_accepts_all_kinds() {
        // No recorder installed: the counters are no-ops and reporting must not panic.
        let reporter = TracingReporter::new();
        reporter.report(&CareEvent::escalation(
            EscalationReason::HelpKeywordDetected,
            "help me",
        ));
        reporter.report(
            &CareEvent::concern(ConcernKind::CoughLikeEvent, "*cough*").with_session_id("s-1"),
        );
    }
}
