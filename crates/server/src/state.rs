//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use care_agent_agent::{EscalationReporter, TracingReporter};
use care_agent_config::Settings;
use care_agent_telephony::{CallDispatcher, CallPlacer};

use crate::session::SessionRegistry;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Settings, built once at startup and read-only afterwards
    pub config: Arc<Settings>,
    pub sessions: Arc<SessionRegistry>,
    /// Outbound call placement, `None` when the HTTP client could not be built
    pub dispatcher: Option<Arc<dyn CallPlacer>>,
    /// Where call sessions send escalations and concerns
    pub reporter: Arc<dyn EscalationReporter>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Settings) -> Self {
        let dispatcher = match CallDispatcher::new(config.dispatch.clone()) {
            Ok(dispatcher) => Some(Arc::new(dispatcher) as Arc<dyn CallPlacer>),
            Err(e) => {
                tracing::warn!(error = %e, "Call dispatch disabled");
                None
            },
        };

        Self {
            sessions: Arc::new(SessionRegistry::new(config.server.max_sessions)),
            config: Arc::new(config),
            dispatcher,
            reporter: Arc::new(TracingReporter::new()),
            metrics: None,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn CallPlacer>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn EscalationReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
