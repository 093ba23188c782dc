//! Weather-triggered check-in calls

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::{CallPlacer, PlacedCall};
use crate::request::CallRequest;
use crate::DispatchError;

/// Source of "is the weather extreme where this person lives"
#[async_trait]
pub trait WeatherMonitor: Send + Sync {
    async fn is_extreme(&self, person_id: &str) -> bool;

    fn name(&self) -> &str;
}

/// Always reports extreme weather. Used for demos until a forecast source
/// is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeExtreme;

#[async_trait]
impl WeatherMonitor for AssumeExtreme {
    async fn is_extreme(&self, _person_id: &str) -> bool {
        true
    }

    fn name(&self) -> &str {
        "assume_extreme"
    }
}

/// Places a weather call when the monitor says so
pub struct WeatherTrigger {
    placer: Arc<dyn CallPlacer>,
    monitor: Arc<dyn WeatherMonitor>,
}

impl WeatherTrigger {
    pub fn new(placer: Arc<dyn CallPlacer>, monitor: Arc<dyn WeatherMonitor>) -> Self {
        Self { placer, monitor }
    }

    /// `Ok(None)` when the weather is fine and no call was placed
    pub async fn trigger_on_extreme_weather(
        &self,
        phone_number: &str,
        person_id: &str,
    ) -> Result<Option<PlacedCall>, DispatchError> {
        if !self.monitor.is_extreme(person_id).await {
            tracing::info!(
                person_id,
                monitor = self.monitor.name(),
                "No extreme weather, skipping call"
            );
            return Ok(None);
        }

        tracing::info!(person_id, "Extreme weather detected, placing check-in call");
        let request = CallRequest::new(phone_number)
            .with_reason("weather")
            .with_lang_pref("auto")
            .with_person_id(person_id);

        self.placer.place_call(&request).await.map(Some)
    }
}
