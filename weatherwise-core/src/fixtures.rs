//! Snapshots shared by unit tests.

use chrono::NaiveDate;

use crate::model::{
    Alerts, Astro, Condition, CurrentWeather, DayWeather, Forecast, ForecastDay, Location,
    WeatherData,
};

/// A mild, dry, calm afternoon with one forecast day.
pub fn snapshot() -> WeatherData {
    WeatherData {
        location: Location {
            name: "Lisbon".into(),
            region: "Lisbon".into(),
            country: "PT".into(),
            lat: 38.72,
            lon: -9.14,
            tz_id: "UTC+1".into(),
            localtime_epoch: 1_717_236_000,
        },
        current: CurrentWeather {
            last_updated_epoch: 1_717_236_000,
            temp_c: 20.0,
            temp_f: 68.0,
            is_day: true,
            condition: condition("Clear sky", 800),
            wind_kph: 10.0,
            wind_mph: 6.2,
            wind_degree: 0.0,
            wind_dir: "N".into(),
            pressure_mb: 1015.0,
            precip_mm: 0.0,
            humidity: 50,
            cloud: 0,
            feelslike_c: 20.0,
            feelslike_f: 68.0,
            vis_km: 10.0,
            uv: 2,
            gust_kph: 15.0,
        },
        forecast: Forecast { forecastday: vec![day(22.0, 12.0, 10)] },
        alerts: Alerts::default(),
    }
}

pub fn condition(text: &str, code: u32) -> Condition {
    Condition { text: text.into(), icon: String::new(), code }
}

pub fn day(max: f64, min: f64, chance_of_rain: u8) -> ForecastDay {
    ForecastDay {
        date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default(),
        day: DayWeather {
            maxtemp_c: max,
            maxtemp_f: 0.0,
            mintemp_c: min,
            mintemp_f: 0.0,
            avgtemp_c: (max + min) / 2.0,
            avgtemp_f: 0.0,
            maxwind_kph: 20.0,
            totalprecip_mm: 0.0,
            daily_chance_of_rain: chance_of_rain,
            daily_will_it_rain: false,
            condition: condition("Clear sky", 800),
            uv: 5,
        },
        astro: Astro { sunrise: "06:12".into(), sunset: "21:03".into() },
        hour: Vec::new(),
    }
}
