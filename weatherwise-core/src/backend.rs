//! Persistence of profiles, locations, history, insights and reviews.
//!
//! Failures here never break the weather or insight flow: callers log and
//! move on. Review validation is the exception, it is reported to the user
//! before any request leaves the process.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::config::{Config, ServiceId};

pub mod records;
pub mod supabase;

pub use records::*;
pub use supabase::SupabaseClient;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend returned no rows for {0}")]
    EmptyResponse(&'static str),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange(u8),
}

/// The slice of persistence the weather session relies on.
#[async_trait]
pub trait UserDataStore: Send + Sync + Debug {
    async fn user_allergies(&self, user_id: &str) -> Result<Vec<String>, BackendError>;

    async fn record_weather(&self, entry: &NewWeatherHistory) -> Result<(), BackendError>;

    async fn save_insight(&self, insight: &NewStoredInsight) -> Result<(), BackendError>;
}

/// Builds the Supabase client when both project URL and key are configured.
pub fn backend_from_config(config: &Config) -> anyhow::Result<SupabaseClient> {
    let id = ServiceId::Supabase;
    let service = config
        .service(id)
        .filter(|_| config.is_configured(id))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Database not configured.\n\
                 Hint: run `weatherwise configure {id}` or set SUPABASE_URL and SUPABASE_ANON_KEY."
            )
        })?;

    let base_url = service.base_url.as_deref().unwrap_or_default();
    Ok(SupabaseClient::new(base_url, service.api_key.clone()))
}
