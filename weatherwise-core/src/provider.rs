use crate::{
    Config, LocationMatch, WeatherData,
    config::ServiceId,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of canonical weather snapshots.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Geocodes a free-text query and fetches weather for the best match.
    async fn weather_by_location(&self, query: &str) -> anyhow::Result<WeatherData>;

    async fn weather_by_coords(&self, lat: f64, lon: f64) -> anyhow::Result<WeatherData>;

    /// Search suggestions; never fails, an unavailable provider yields no matches.
    async fn search_locations(&self, query: &str) -> Vec<LocationMatch>;
}

/// Construct the weather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = ServiceId::OpenWeather;
    let service = config.service(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for '{id}'.\n\
                 Hint: run `weatherwise configure {id}` or set OPENWEATHER_API_KEY."
        )
    })?;

    let provider = match service.base_url.as_deref() {
        Some(base) => OpenWeatherProvider::with_base_url(service.api_key.clone(), base),
        None => OpenWeatherProvider::new(service.api_key.clone()),
    };

    Ok(Box::new(provider))
}
