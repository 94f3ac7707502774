//! Drives one user's lookups: weather, suggestions and insights, with
//! best-effort persistence on the side.

use anyhow::{Result, anyhow};
use chrono::Utc;

use crate::{
    backend::{NewStoredInsight, NewWeatherHistory, UserDataStore},
    insight::service::{Insight, InsightService},
    model::{LocationMatch, WeatherData},
    provider::WeatherProvider,
    state::WeatherState,
};

/// Queries shorter than this do not trigger suggestions.
pub const MIN_SUGGEST_LEN: usize = 2;

#[derive(Debug)]
pub struct WeatherSession {
    provider: Box<dyn WeatherProvider>,
    insights: InsightService,
    store: Option<Box<dyn UserDataStore>>,
    user_id: Option<String>,
    state: WeatherState,
}

impl WeatherSession {
    pub fn new(provider: Box<dyn WeatherProvider>, insights: InsightService) -> Self {
        Self { provider, insights, store: None, user_id: None, state: WeatherState::default() }
    }

    /// Persists history and insights for `user_id`.
    pub fn with_store(mut self, store: Box<dyn UserDataStore>, user_id: String) -> Self {
        self.store = Some(store);
        self.user_id = Some(user_id);
        self
    }

    pub fn with_insights(mut self, insights: InsightService) -> Self {
        self.insights = insights;
        self
    }

    pub fn with_state(mut self, state: WeatherState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &WeatherState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WeatherState {
        &mut self.state
    }

    pub fn weather(&self) -> Option<&WeatherData> {
        self.state.current_weather.as_ref()
    }

    /// Weather for a free-text location.
    pub async fn search(&mut self, query: &str) -> Result<&WeatherData> {
        self.state.set_search_query(query);
        self.begin();
        let fetched = self.provider.weather_by_location(query).await;
        self.finish(fetched).await
    }

    /// Weather for a coordinate pair.
    pub async fn locate(&mut self, lat: f64, lon: f64) -> Result<&WeatherData> {
        self.begin();
        let fetched = self.provider.weather_by_coords(lat, lon).await;
        self.finish(fetched).await
    }

    pub async fn suggest(&mut self, query: &str) -> Vec<LocationMatch> {
        self.state.set_search_query(query);
        if query.trim().chars().count() < MIN_SUGGEST_LEN {
            return Vec::new();
        }
        self.provider.search_locations(query.trim()).await
    }

    /// Generates an insight for the loaded snapshot, personalized with the
    /// stored allergies, replacing the previous one.
    pub async fn refresh_insight(&mut self) -> Result<Insight> {
        self.snapshot()?;
        let allergies = self.allergies().await;
        self.refresh_insight_for(&allergies).await
    }

    /// Like [`Self::refresh_insight`] with an explicit allergy list.
    pub async fn refresh_insight_for(&mut self, allergies: &[String]) -> Result<Insight> {
        let snapshot = self.snapshot()?;
        let location = snapshot.location.name.clone();
        let insight = self.insights.generate(snapshot, &location, allergies).await;

        if let (Some(store), Some(user_id)) = (&self.store, &self.user_id) {
            let row = NewStoredInsight::new(user_id, &location, snapshot, &insight.result, Utc::now());
            if let Err(err) = store.save_insight(&row).await {
                tracing::warn!(user_id, error = %err, "failed to save insight");
            }
        }

        self.state.set_ai_insight(Some(insight.result.clone()));
        Ok(insight)
    }

    pub async fn activities(&self) -> Result<Vec<String>> {
        let snapshot = self.snapshot()?;
        Ok(self.insights.activities(snapshot, &snapshot.location.name).await)
    }

    fn snapshot(&self) -> Result<&WeatherData> {
        self.weather()
            .ok_or_else(|| anyhow!("No weather data loaded. Search for a location first."))
    }

    async fn allergies(&self) -> Vec<String> {
        let (Some(store), Some(user_id)) = (&self.store, &self.user_id) else {
            return Vec::new();
        };

        match store.user_allergies(user_id).await {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!(user_id, error = %err, "could not load user allergies");
                Vec::new()
            }
        }
    }

    fn begin(&mut self) {
        self.state.set_loading(true);
        self.state.set_error(None);
    }

    async fn finish(&mut self, fetched: Result<WeatherData>) -> Result<&WeatherData> {
        self.state.set_loading(false);

        let data = match fetched {
            Ok(data) => data,
            Err(err) => {
                self.state.set_error(Some(err.to_string()));
                return Err(err);
            }
        };

        if let (Some(store), Some(user_id)) = (&self.store, &self.user_id) {
            let entry = NewWeatherHistory::from_snapshot(user_id, &data, Utc::now());
            if let Err(err) = store.record_weather(&entry).await {
                tracing::warn!(user_id, error = %err, "failed to record weather history");
            }
        }

        self.state.set_ai_insight(None);
        Ok(self.state.current_weather.insert(data))
    }
}
