//! Raw OpenWeather payloads (`units=metric`).
//!
//! Everything the provider may omit is defaulted so partially populated
//! responses still deserialize.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OwCoord {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwWeather {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwMain {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub temp_min: f64,
    #[serde(default)]
    pub temp_max: f64,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub humidity: u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwWind {
    /// Metres per second.
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: f64,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OwClouds {
    #[serde(default)]
    pub all: u8,
}

/// Rain or snow volume in millimetres.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OwPrecip {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwSys {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// `/data/2.5/weather`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwCurrentResponse {
    #[serde(default)]
    pub coord: OwCoord,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
    pub main: OwMain,
    /// Metres.
    pub visibility: Option<f64>,
    #[serde(default)]
    pub wind: OwWind,
    #[serde(default)]
    pub clouds: OwClouds,
    pub rain: Option<OwPrecip>,
    pub snow: Option<OwPrecip>,
    pub dt: i64,
    #[serde(default)]
    pub sys: OwSys,
    /// Shift in seconds from UTC.
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub name: String,
}

/// One 3-hour step of `/data/2.5/forecast`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwInterval {
    pub dt: i64,
    pub main: OwMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
    #[serde(default)]
    pub clouds: OwClouds,
    #[serde(default)]
    pub wind: OwWind,
    pub visibility: Option<f64>,
    /// Probability of precipitation, `0.0..=1.0`.
    #[serde(default)]
    pub pop: f64,
    pub rain: Option<OwPrecip>,
    pub snow: Option<OwPrecip>,
    #[serde(default)]
    pub dt_txt: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwCity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub coord: OwCoord,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// `/data/2.5/forecast`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwForecastResponse {
    #[serde(default)]
    pub list: Vec<OwInterval>,
    #[serde(default)]
    pub city: OwCity,
}

/// `/geo/1.0/direct` and `/geo/1.0/reverse` entries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwGeocodingResult {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: String,
    pub state: Option<String>,
}

impl OwPrecip {
    pub fn last_hour(precip: Option<&OwPrecip>) -> f64 {
        precip.and_then(|p| p.one_hour).unwrap_or(0.0)
    }

    pub fn last_three_hours(precip: Option<&OwPrecip>) -> f64 {
        precip.and_then(|p| p.three_hours).unwrap_or(0.0)
    }
}
