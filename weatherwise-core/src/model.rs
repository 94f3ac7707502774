//! Canonical, provider-agnostic weather snapshot.
//!
//! Field names follow the snapshot's JSON shape (`temp_c`, `forecastday`, ...)
//! so serialized snapshots stay stable whichever provider produced them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    /// Offset label such as `UTC+2`.
    pub tz_id: String,
    pub localtime_epoch: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    pub code: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub last_updated_epoch: i64,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: bool,
    pub condition: Condition,
    pub wind_kph: f64,
    pub wind_mph: f64,
    pub wind_degree: f64,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub precip_mm: f64,
    pub humidity: u8,
    pub cloud: u8,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub vis_km: f64,
    /// Estimated from cloud cover, not measured.
    pub uv: u8,
    pub gust_kph: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourWeather {
    /// Provider-local timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub time: String,
    pub time_epoch: i64,
    pub temp_c: f64,
    pub temp_f: f64,
    pub humidity: u8,
    pub chance_of_rain: u8,
    pub will_it_rain: bool,
    pub condition: Condition,
    pub wind_kph: f64,
    pub uv: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayWeather {
    pub maxtemp_c: f64,
    pub maxtemp_f: f64,
    pub mintemp_c: f64,
    pub mintemp_f: f64,
    pub avgtemp_c: f64,
    pub avgtemp_f: f64,
    pub maxwind_kph: f64,
    pub totalprecip_mm: f64,
    pub daily_chance_of_rain: u8,
    pub daily_will_it_rain: bool,
    pub condition: Condition,
    pub uv: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Astro {
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub day: DayWeather,
    pub astro: Astro,
    pub hour: Vec<HourWeather>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Forecast {
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Alert {
    pub headline: String,
    pub severity: String,
    pub event: String,
    pub effective: String,
    pub expires: String,
    pub desc: String,
    pub instruction: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Alerts {
    pub alert: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub location: Location,
    pub current: CurrentWeather,
    pub forecast: Forecast,
    #[serde(default)]
    pub alerts: Alerts,
}

impl WeatherData {
    /// First forecast day, usually today.
    pub fn today(&self) -> Option<&ForecastDay> {
        self.forecast.forecastday.first()
    }

    /// Today's rain probability, 0 when there is no forecast.
    pub fn rain_probability(&self) -> u8 {
        self.today().map(|d| d.day.daily_chance_of_rain).unwrap_or(0)
    }
}

/// A location suggestion returned by free-text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationMatch {
    pub id: usize,
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    /// `"name, country"`, usable as a follow-up query.
    pub url: String,
}
