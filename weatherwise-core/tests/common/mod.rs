//! Payloads and snapshots shared by the integration tests.
#![allow(dead_code)]

use weatherwise_core::{
    WeatherData,
    normalize::normalize,
    raw::{OwCurrentResponse, OwForecastResponse},
};

pub fn geocoding_response() -> serde_json::Value {
    serde_json::json!([
        { "name": "Lisbon", "lat": 38.72, "lon": -9.14, "country": "PT", "state": "Lisbon" }
    ])
}

pub fn current_response() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lat": 38.72, "lon": -9.14 },
        "weather": [{ "id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d" }],
        "main": { "temp": 18.0, "feels_like": 17.5, "temp_min": 16.0, "temp_max": 20.0, "pressure": 1016, "humidity": 64 },
        "wind": { "speed": 5.0, "deg": 90 },
        "clouds": { "all": 20 },
        "dt": 1_717_236_000,
        "sys": { "country": "PT", "sunrise": 1_717_217_000, "sunset": 1_717_270_000 },
        "timezone": 3600,
        "name": "Lisbon"
    })
}

pub fn forecast_response() -> serde_json::Value {
    let interval = |dt: i64, dt_txt: &str, temp: f64, pop: f64| {
        serde_json::json!({
            "dt": dt,
            "main": { "temp": temp, "feels_like": temp, "temp_min": temp, "temp_max": temp, "pressure": 1015, "humidity": 60 },
            "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
            "clouds": { "all": 75 },
            "wind": { "speed": 4.0, "deg": 200 },
            "pop": pop,
            "dt_txt": dt_txt
        })
    };

    serde_json::json!({
        "list": [
            interval(1_717_236_000, "2024-06-01 09:00:00", 17.0, 0.2),
            interval(1_717_246_800, "2024-06-01 12:00:00", 21.0, 0.4),
            interval(1_717_322_400, "2024-06-02 09:00:00", 19.0, 0.0)
        ],
        "city": { "name": "Lisbon", "country": "PT", "timezone": 3600, "sunrise": 0, "sunset": 0 }
    })
}

/// The mock payloads above, normalized.
pub fn snapshot() -> WeatherData {
    let current: OwCurrentResponse = serde_json::from_value(current_response()).unwrap();
    let forecast: OwForecastResponse = serde_json::from_value(forecast_response()).unwrap();
    normalize(&current, &forecast, "Lisbon", "PT", Some("Lisbon"))
}
