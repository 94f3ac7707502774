use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{
    model::{LocationMatch, WeatherData},
    normalize::normalize,
    raw::{OwCurrentResponse, OwForecastResponse, OwGeocodingResult},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const SEARCH_LIMIT: u8 = 10;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse OpenWeather {what} JSON"))
    }

    pub async fn geocode(&self, query: &str, limit: u8) -> Result<Vec<OwGeocodingResult>> {
        self.get_json(
            "/geo/1.0/direct",
            "geocoding",
            &[("q", query.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Vec<OwGeocodingResult>> {
        self.get_json(
            "/geo/1.0/reverse",
            "reverse geocoding",
            &[("lat", lat.to_string()), ("lon", lon.to_string()), ("limit", "1".to_string())],
        )
        .await
    }

    pub async fn fetch_current(&self, lat: f64, lon: f64) -> Result<OwCurrentResponse> {
        self.get_json("/data/2.5/weather", "current weather", &coords_params(lat, lon))
            .await
    }

    pub async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<OwForecastResponse> {
        self.get_json("/data/2.5/forecast", "5-day forecast", &coords_params(lat, lon))
            .await
    }

    async fn fetch_pair(&self, lat: f64, lon: f64) -> Result<(OwCurrentResponse, OwForecastResponse)> {
        let current = self.fetch_current(lat, lon).await?;
        let forecast = self.fetch_forecast(lat, lon).await?;
        tracing::info!(lat, lon, intervals = forecast.list.len(), "weather data received from OpenWeather");
        Ok((current, forecast))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn weather_by_location(&self, query: &str) -> Result<WeatherData> {
        tracing::debug!(query, "searching for location");

        let place = self
            .geocode(query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Location not found: {query}"))?;

        let (current, forecast) = self.fetch_pair(place.lat, place.lon).await?;

        Ok(normalize(&current, &forecast, &place.name, &place.country, place.state.as_deref()))
    }

    async fn weather_by_coords(&self, lat: f64, lon: f64) -> Result<WeatherData> {
        let (current, forecast) = self.fetch_pair(lat, lon).await?;

        let mut name = if current.name.is_empty() {
            "Current Location".to_string()
        } else {
            current.name.clone()
        };
        let mut country = current.sys.country.clone();
        let mut region = None;

        match self.reverse_geocode(lat, lon).await {
            Ok(results) => {
                if let Some(place) = results.into_iter().next() {
                    if !place.name.is_empty() {
                        name = place.name;
                    }
                    if !place.country.is_empty() {
                        country = place.country;
                    }
                    region = place.state;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "reverse geocoding failed, using default location name");
            }
        }

        Ok(normalize(&current, &forecast, &name, &country, region.as_deref()))
    }

    async fn search_locations(&self, query: &str) -> Vec<LocationMatch> {
        match self.geocode(query, SEARCH_LIMIT).await {
            Ok(results) => {
                let matches: Vec<LocationMatch> = results
                    .into_iter()
                    .enumerate()
                    .map(|(id, r)| LocationMatch {
                        id,
                        url: format!("{}, {}", r.name, r.country),
                        region: r.state.unwrap_or_default(),
                        name: r.name,
                        country: r.country,
                        lat: r.lat,
                        lon: r.lon,
                    })
                    .collect();
                tracing::debug!(query, found = matches.len(), "location search finished");
                matches
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "location search failed");
                Vec::new()
            }
        }
    }
}

fn coords_params(lat: f64, lon: f64) -> [(&'static str, String); 3] {
    [("lat", lat.to_string()), ("lon", lon.to_string()), ("units", "metric".to_string())]
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);

        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn base_url_is_trimmed() {
        let p = OpenWeatherProvider::with_base_url("k".into(), "http://localhost:1234/");
        assert_eq!(p.base_url, "http://localhost:1234");
    }
}
