//! Deterministic insight rules used when no model is reachable.

use async_trait::async_trait;

use crate::{
    model::{CurrentWeather, WeatherData},
    units::round_half_up,
};

use super::{InsightError, InsightProvider, InsightResult, MAX_SUGGESTIONS};

pub const HIGH_POLLEN_ALERT: &str =
    "High pollen risk - warm, dry, and windy conditions favor pollen spread";
pub const MOLD_ALERT: &str = "Moderate mold risk - high humidity may trigger mold allergies";
pub const LOW_RISK_ALERT: &str = "Low allergy risk - cold weather reduces pollen and mold activity";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TempBand {
    Hot,
    Warm,
    Mild,
    Cool,
    Cold,
}

impl TempBand {
    fn of(temp: i64) -> Self {
        match temp {
            t if t > 30 => TempBand::Hot,
            t if t > 25 => TempBand::Warm,
            t if t > 15 => TempBand::Mild,
            t if t > 5 => TempBand::Cool,
            _ => TempBand::Cold,
        }
    }

    fn suggestions(self) -> [&'static str; 3] {
        match self {
            TempBand::Hot => [
                "Stay hydrated - drink plenty of water throughout the day",
                "Wear light, breathable clothing in light colors",
                "Avoid strenuous outdoor activities during peak heat hours (12-4 PM)",
            ],
            TempBand::Warm => [
                "Perfect weather for outdoor activities like picnics or sports",
                "Wear comfortable, breathable clothing",
                "Don't forget your sunglasses and light sun protection",
            ],
            TempBand::Mild => [
                "Ideal temperature for a walk or outdoor dining",
                "Layer your clothing for comfort as temperature changes",
                "Great time for sightseeing or exploring the city",
            ],
            TempBand::Cool => [
                "Wear a light jacket or sweater when going outside",
                "Good weather for indoor activities with short outdoor breaks",
                "Warm beverages would be enjoyable in this weather",
            ],
            TempBand::Cold => [
                "Dress warmly in multiple layers",
                "Protect exposed skin from cold temperatures",
                "Perfect weather for cozy indoor activities",
            ],
        }
    }
}

/// Rule-based insight for `snapshot`.
///
/// `_user_allergies` is accepted so both insight paths share a call shape;
/// it does not influence the result and `personalized_allergy_alert` is
/// always `None`.
pub fn fallback_insight(
    snapshot: &WeatherData,
    location: &str,
    _user_allergies: Option<&[String]>,
) -> InsightResult {
    let current = &snapshot.current;
    let temp = round_half_up(current.temp_c) as i64;
    let feels_like = round_half_up(current.feelslike_c) as i64;
    let band = TempBand::of(temp);

    InsightResult {
        insight: narrative(band, location, temp, feels_like, &current.condition.text),
        suggestions: suggestions(snapshot, band),
        rain_probability: snapshot.rain_probability(),
        allergy_alert: allergy_alert(current).map(str::to_string),
        personalized_allergy_alert: None,
    }
}

fn narrative(band: TempBand, location: &str, temp: i64, feels_like: i64, condition: &str) -> String {
    match band {
        TempBand::Hot => format!(
            "It's quite hot in {location} with temperatures reaching {temp}°C. The heat index makes it feel like {feels_like}°C."
        ),
        TempBand::Warm => format!(
            "Pleasant warm weather in {location} at {temp}°C, feeling like {feels_like}°C. Perfect for outdoor activities!"
        ),
        TempBand::Mild => format!(
            "Comfortable temperature in {location} at {temp}°C. {condition} conditions with moderate temperatures."
        ),
        TempBand::Cool => format!(
            "Cool weather in {location} at {temp}°C, feeling like {feels_like}°C. Consider wearing a light jacket."
        ),
        TempBand::Cold => format!(
            "Cold conditions in {location} at {temp}°C. Bundle up! It feels even colder at {feels_like}°C."
        ),
    }
}

fn suggestions(snapshot: &WeatherData, band: TempBand) -> Vec<String> {
    let current = &snapshot.current;
    let wind = round_half_up(current.wind_kph) as i64;
    let mut out: Vec<&'static str> = band.suggestions().to_vec();

    match current.uv {
        uv if uv >= 8 => out.push("⚠️ Very high UV index - apply SPF 30+ sunscreen every 2 hours"),
        uv if uv >= 6 => out.push("☀️ High UV levels - use sunscreen and wear a hat"),
        uv if uv >= 3 => {
            out.push("🕶️ Moderate UV - sun protection recommended for extended outdoor time")
        }
        _ => {}
    }

    if wind > 40 {
        out.push("💨 Very windy conditions - secure loose items and be cautious outdoors");
    } else if wind > 25 {
        out.push("🌬️ Windy weather - hold onto hats and umbrellas");
    }

    if current.humidity > 80 {
        out.push("💧 High humidity makes it feel warmer - stay in air-conditioned spaces when possible");
    } else if current.humidity < 30 {
        out.push("🏜️ Low humidity - moisturize skin and stay hydrated");
    }

    if current.vis_km < 5.0 {
        out.push("🌫️ Reduced visibility - drive carefully with headlights on");
    }

    let condition = current.condition.text.to_lowercase();
    if condition.contains("rain") {
        out.push("☔ Carry an umbrella and wear waterproof clothing");
    } else if condition.contains("snow") {
        out.push("❄️ Snow conditions - wear warm, waterproof boots and layers");
    } else if condition.contains("storm") || condition.contains("thunder") {
        out.push("⛈️ Thunderstorm risk - stay indoors and avoid unnecessary travel");
    }

    if let Some(today) = snapshot.today() {
        let spread =
            round_half_up(today.day.maxtemp_c) as i64 - round_half_up(today.day.mintemp_c) as i64;
        if spread > 15 {
            out.push("🌡️ Large temperature variation today - dress in layers you can adjust");
        }
        if today.day.daily_chance_of_rain > 60 {
            out.push("🌧️ High chance of rain - keep an umbrella handy");
        }
    }

    out.into_iter().take(MAX_SUGGESTIONS).map(str::to_string).collect()
}

/// General allergy risk; the first matching rule wins.
pub fn allergy_alert(current: &CurrentWeather) -> Option<&'static str> {
    let temp = round_half_up(current.temp_c) as i64;
    let wind = round_half_up(current.wind_kph) as i64;

    if temp > 15 && temp < 25 && current.humidity < 60 && wind > 15 {
        Some(HIGH_POLLEN_ALERT)
    } else if current.humidity > 70 || current.precip_mm > 0.0 {
        Some(MOLD_ALERT)
    } else if temp < 10 {
        Some(LOW_RISK_ALERT)
    } else {
        None
    }
}

/// Activity ideas without a model.
pub fn fallback_activities(snapshot: &WeatherData) -> Vec<String> {
    let temp = snapshot.current.temp_c;
    let condition = snapshot.current.condition.text.to_lowercase();

    let activities: &[&str] = if condition.contains("rain") || condition.contains("storm") {
        &[
            "Visit a museum or art gallery",
            "Indoor shopping",
            "Catch up on reading at a cozy cafe",
            "Indoor swimming or gym workout",
        ]
    } else if temp > 28.0 {
        &[
            "Swimming or water sports",
            "Indoor activities during peak heat",
            "Evening outdoor dining",
            "Visit air-conditioned venues",
        ]
    } else if temp < 10.0 {
        &[
            "Visit indoor attractions",
            "Hot beverage at a warm cafe",
            "Indoor sports or activities",
            "Museum or cultural center visit",
        ]
    } else {
        &[
            "Outdoor walk or hiking",
            "Picnic in the park",
            "Outdoor sports",
            "Sightseeing and exploration",
            "Outdoor dining",
            "Photography walk",
        ]
    };

    activities.iter().map(|a| a.to_string()).collect()
}

/// [`InsightProvider`] over the fixed rules; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedInsightProvider;

impl RuleBasedInsightProvider {
    pub fn insight(&self, snapshot: &WeatherData, location: &str, allergies: &[String]) -> InsightResult {
        fallback_insight(snapshot, location, Some(allergies))
    }
}

#[async_trait]
impl InsightProvider for RuleBasedInsightProvider {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn generate(
        &self,
        snapshot: &WeatherData,
        location: &str,
        allergies: &[String],
    ) -> Result<InsightResult, InsightError> {
        Ok(self.insight(snapshot, location, allergies))
    }

    async fn activities(
        &self,
        snapshot: &WeatherData,
        _location: &str,
    ) -> Result<Vec<String>, InsightError> {
        Ok(fallback_activities(snapshot))
    }
}
