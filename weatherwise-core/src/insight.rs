//! Prose insights for a weather snapshot.
//!
//! Two [`InsightProvider`]s exist: [`remote::RemoteInsightProvider`] asks a
//! generative model, [`rules::RuleBasedInsightProvider`] evaluates fixed
//! thresholds. [`service::InsightService`] tries the former and falls back
//! to the latter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::model::WeatherData;

pub mod remote;
pub mod rules;
pub mod service;

pub const MAX_SUGGESTIONS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResult {
    pub insight: String,
    /// Highest priority first, at most [`MAX_SUGGESTIONS`].
    pub suggestions: Vec<String>,
    /// Percent, copied from the first forecast day.
    pub rain_probability: u8,
    pub allergy_alert: Option<String>,
    /// Only produced by the remote provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalized_allergy_alert: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error("insight request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("insight service returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("insight response contained no text")]
    EmptyResponse,
    #[error("could not find JSON in model output")]
    NoJson,
    #[error("failed to parse model output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid insight shape: {0}")]
    InvalidShape(String),
}

#[async_trait]
pub trait InsightProvider: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    async fn generate(
        &self,
        snapshot: &WeatherData,
        location: &str,
        allergies: &[String],
    ) -> Result<InsightResult, InsightError>;

    /// 4–6 activity ideas suited to the current weather.
    async fn activities(
        &self,
        snapshot: &WeatherData,
        location: &str,
    ) -> Result<Vec<String>, InsightError>;
}

/// Allergy categories a profile can list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allergy {
    Pollen,
    Grass,
    TreePollen,
    Ragweed,
    Mold,
    Dust,
    Pollution,
    Humidity,
}

impl Allergy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Allergy::Pollen => "pollen",
            Allergy::Grass => "grass",
            Allergy::TreePollen => "tree_pollen",
            Allergy::Ragweed => "ragweed",
            Allergy::Mold => "mold",
            Allergy::Dust => "dust",
            Allergy::Pollution => "pollution",
            Allergy::Humidity => "humidity",
        }
    }

    pub const fn all() -> &'static [Allergy] {
        &[
            Allergy::Pollen,
            Allergy::Grass,
            Allergy::TreePollen,
            Allergy::Ragweed,
            Allergy::Mold,
            Allergy::Dust,
            Allergy::Pollution,
            Allergy::Humidity,
        ]
    }
}

impl std::fmt::Display for Allergy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Allergy {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase().replace(['-', ' '], "_");
        Allergy::all()
            .iter()
            .copied()
            .find(|a| a.as_str() == lower)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown allergy '{value}'. Supported: pollen, grass, tree_pollen, ragweed, mold, dust, pollution, humidity."
                )
            })
    }
}
