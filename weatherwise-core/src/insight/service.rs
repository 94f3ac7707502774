use serde::Serialize;

use crate::{
    config::{Config, ServiceId},
    model::WeatherData,
};

use super::{
    InsightProvider, InsightResult,
    remote::RemoteInsightProvider,
    rules::{RuleBasedInsightProvider, fallback_activities},
};

/// Which path produced an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    Remote,
    RuleBased,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub result: InsightResult,
    pub source: InsightSource,
}

/// Model first, rules when the model is missing or fails.
#[derive(Debug, Default)]
pub struct InsightService {
    remote: Option<Box<dyn InsightProvider>>,
    rules: RuleBasedInsightProvider,
}

impl InsightService {
    pub fn rule_based() -> Self {
        Self::default()
    }

    pub fn with_remote(remote: Box<dyn InsightProvider>) -> Self {
        Self { remote: Some(remote), rules: RuleBasedInsightProvider }
    }

    /// Uses Gemini when a key is configured.
    pub fn from_config(config: &Config) -> Self {
        match config.service(ServiceId::Gemini) {
            Some(gemini) => {
                let mut provider =
                    RemoteInsightProvider::new(gemini.api_key.clone(), gemini.model.clone());
                if let Some(base) = gemini.base_url.as_deref() {
                    provider = provider.with_base_url(base);
                }
                Self::with_remote(Box::new(provider))
            }
            None => Self::rule_based(),
        }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn generate(
        &self,
        snapshot: &WeatherData,
        location: &str,
        allergies: &[String],
    ) -> Insight {
        if let Some(remote) = &self.remote {
            match remote.generate(snapshot, location, allergies).await {
                Ok(result) => return Insight { result, source: InsightSource::Remote },
                Err(err) => {
                    tracing::warn!(provider = remote.name(), error = %err, "insight service unavailable, using fallback insights");
                }
            }
        }

        Insight {
            result: self.rules.insight(snapshot, location, allergies),
            source: InsightSource::RuleBased,
        }
    }

    pub async fn activities(&self, snapshot: &WeatherData, location: &str) -> Vec<String> {
        if let Some(remote) = &self.remote {
            match remote.activities(snapshot, location).await {
                Ok(list) if !list.is_empty() => return list,
                Ok(_) => tracing::warn!(provider = remote.name(), "model returned no activities"),
                Err(err) => {
                    tracing::warn!(provider = remote.name(), error = %err, "activity recommendations unavailable, using fallback");
                }
            }
        }

        fallback_activities(snapshot)
    }
}
