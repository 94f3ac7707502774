//! In-memory view state of one client.

use crate::{
    backend::{SavedLocation, SavedLocationUpdate},
    insight::InsightResult,
    model::WeatherData,
    units::TemperatureUnit,
};

#[derive(Debug, Clone, Default)]
pub struct WeatherState {
    pub current_weather: Option<WeatherData>,
    pub selected_location: Option<SavedLocation>,
    pub saved_locations: Vec<SavedLocation>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub ai_insight: Option<InsightResult>,
    pub search_query: String,
    pub temperature_unit: TemperatureUnit,
}

impl WeatherState {
    pub fn with_unit(unit: TemperatureUnit) -> Self {
        Self { temperature_unit: unit, ..Self::default() }
    }

    pub fn set_current_weather(&mut self, data: WeatherData) {
        self.current_weather = Some(data);
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn set_selected_location(&mut self, location: Option<SavedLocation>) {
        self.selected_location = location;
    }

    pub fn set_saved_locations(&mut self, locations: Vec<SavedLocation>) {
        self.saved_locations = locations;
    }

    /// Newest saved location goes first.
    pub fn add_saved_location(&mut self, location: SavedLocation) {
        self.saved_locations.insert(0, location);
    }

    pub fn remove_saved_location(&mut self, id: &str) {
        self.saved_locations.retain(|loc| loc.id != id);
    }

    /// Applies a partial update; unknown ids are ignored.
    pub fn update_saved_location(&mut self, id: &str, changes: &SavedLocationUpdate) {
        if let Some(loc) = self.saved_locations.iter_mut().find(|loc| loc.id == id) {
            if let Some(name) = &changes.name {
                loc.name = name.clone();
            }
            if let Some(fav) = changes.is_favorite {
                loc.is_favorite = fav;
            }
        }
    }

    pub fn toggle_favorite(&mut self, id: &str) {
        if let Some(loc) = self.saved_locations.iter_mut().find(|loc| loc.id == id) {
            loc.is_favorite = !loc.is_favorite;
        }
    }

    pub fn set_ai_insight(&mut self, insight: Option<InsightResult>) {
        self.ai_insight = insight;
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_string();
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
    }

    pub fn set_temperature_unit(&mut self, unit: TemperatureUnit) {
        self.temperature_unit = unit;
    }

    pub fn toggle_temperature_unit(&mut self) {
        self.temperature_unit = self.temperature_unit.toggled();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::snapshot;

    fn saved(id: &str, name: &str) -> SavedLocation {
        SavedLocation {
            id: id.into(),
            user_id: "u1".into(),
            name: name.into(),
            country: "PT".into(),
            lat: 0.0,
            lon: 0.0,
            is_favorite: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn saved_locations_prepend_and_remove() {
        let mut state = WeatherState::default();
        state.add_saved_location(saved("1", "Porto"));
        state.add_saved_location(saved("2", "Faro"));

        let names: Vec<_> = state.saved_locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Faro", "Porto"]);

        state.remove_saved_location("2");
        assert_eq!(state.saved_locations.len(), 1);
        state.remove_saved_location("missing");
        assert_eq!(state.saved_locations.len(), 1);
    }

    #[test]
    fn toggle_and_update_only_touch_matching_id() {
        let mut state = WeatherState::default();
        state.set_saved_locations(vec![saved("1", "Porto"), saved("2", "Faro")]);

        state.toggle_favorite("1");
        state.toggle_favorite("nope");
        assert!(state.saved_locations[0].is_favorite);
        assert!(!state.saved_locations[1].is_favorite);

        state.update_saved_location(
            "2",
            &SavedLocationUpdate { name: Some("Faro Beach".into()), is_favorite: None },
        );
        assert_eq!(state.saved_locations[1].name, "Faro Beach");
        assert!(!state.saved_locations[1].is_favorite);
    }

    #[test]
    fn unit_toggles_and_reset_restores_defaults() {
        let mut state = WeatherState::with_unit(TemperatureUnit::Fahrenheit);
        state.toggle_temperature_unit();
        assert_eq!(state.temperature_unit, TemperatureUnit::Celsius);

        state.set_search_query("lis");
        state.set_current_weather(snapshot());
        state.set_error(Some("boom".into()));
        state.clear_search();
        assert!(state.search_query.is_empty());

        state.reset();
        assert!(state.current_weather.is_none());
        assert!(state.error.is_none());
        assert_eq!(state.temperature_unit, TemperatureUnit::Celsius);
    }
}
