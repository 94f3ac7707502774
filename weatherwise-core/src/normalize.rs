//! OpenWeather payloads → canonical [`WeatherData`].
//!
//! The forecast endpoint returns a flat list of 3-hour intervals; they are
//! grouped per calendar day here and folded into daily aggregates. The free
//! tier carries no UV index, so UV values in the snapshot are an estimate
//! derived from cloud cover during daytime hours and must not be presented
//! as measurements.

use std::ops::Range;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::{
    model::{
        Alerts, Astro, Condition, CurrentWeather, DayWeather, Forecast, ForecastDay, HourWeather,
        Location, WeatherData,
    },
    raw::{OwCurrentResponse, OwForecastResponse, OwInterval, OwPrecip, OwWeather},
    units::{celsius_to_fahrenheit, kmh_to_mph, ms_to_kmh, percent, round_half_up, round1},
};

pub const MAX_FORECAST_DAYS: usize = 7;

/// Local hours during which UV is estimated; outside of it UV is 0.
const DAYTIME_HOURS: Range<u32> = 6..18;
const DEFAULT_VISIBILITY_M: f64 = 10_000.0;
const GUST_FACTOR: f64 = 1.5;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Builds the canonical snapshot from a current-conditions payload and a
/// forecast payload for the same place.
pub fn normalize(
    current: &OwCurrentResponse,
    forecast: &OwForecastResponse,
    location_name: &str,
    country: &str,
    region: Option<&str>,
) -> WeatherData {
    let astro = Astro {
        sunrise: format_clock(forecast.city.sunrise, forecast.city.timezone),
        sunset: format_clock(forecast.city.sunset, forecast.city.timezone),
    };

    let forecastday = forecast_days(&forecast.list, &astro, forecast.city.timezone);
    tracing::debug!(
        intervals = forecast.list.len(),
        days = forecastday.len(),
        "normalized forecast"
    );

    WeatherData {
        location: Location {
            name: location_name.to_string(),
            region: region.unwrap_or_default().to_string(),
            country: country.to_string(),
            lat: current.coord.lat,
            lon: current.coord.lon,
            tz_id: timezone_label(current.timezone),
            localtime_epoch: current.dt,
        },
        current: map_current(current),
        forecast: Forecast { forecastday },
        alerts: Alerts::default(),
    }
}

/// Groups intervals per day and aggregates the first [`MAX_FORECAST_DAYS`] groups.
///
/// Grouping follows the UTC `dt_txt` stamps; the UV daytime window is
/// checked against the place's local clock, `utc_offset` seconds ahead.
pub fn forecast_days(intervals: &[OwInterval], astro: &Astro, utc_offset: i64) -> Vec<ForecastDay> {
    group_by_day(intervals)
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .filter_map(|group| aggregate_day(group, astro, utc_offset))
        .collect()
}

struct DayGroup<'a> {
    date: NaiveDate,
    intervals: Vec<(NaiveDateTime, &'a OwInterval)>,
}

/// Groups keep first-appearance order; a date seen again later joins its
/// existing group.
fn group_by_day(intervals: &[OwInterval]) -> Vec<DayGroup<'_>> {
    let mut groups: Vec<DayGroup<'_>> = Vec::new();

    for interval in intervals {
        let Some(time) = interval_time(interval) else {
            continue;
        };
        let date = time.date();

        match groups.iter_mut().find(|g| g.date == date) {
            Some(group) => group.intervals.push((time, interval)),
            None => groups.push(DayGroup { date, intervals: vec![(time, interval)] }),
        }
    }

    groups
}

fn interval_time(interval: &OwInterval) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&interval.dt_txt, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| DateTime::from_timestamp(interval.dt, 0).map(|t| t.naive_utc()))
}

fn local_hour(utc: NaiveDateTime, utc_offset: i64) -> u32 {
    TimeDelta::try_seconds(utc_offset)
        .and_then(|offset| utc.checked_add_signed(offset))
        .unwrap_or(utc)
        .hour()
}

fn aggregate_day(group: DayGroup<'_>, astro: &Astro, utc_offset: i64) -> Option<ForecastDay> {
    let (first_time, first) = *group.intervals.first()?;

    let temps: Vec<f64> = group.intervals.iter().map(|(_, i)| i.main.temp).collect();
    let max_temp = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_temp = temps.iter().copied().fold(f64::INFINITY, f64::min);
    let avg_temp = temps.iter().sum::<f64>() / temps.len() as f64;

    let max_wind = group
        .intervals
        .iter()
        .map(|(_, i)| ms_to_kmh(i.wind.speed))
        .fold(f64::NEG_INFINITY, f64::max);

    let total_precip: f64 = group
        .intervals
        .iter()
        .map(|(_, i)| {
            OwPrecip::last_three_hours(i.rain.as_ref()) + OwPrecip::last_three_hours(i.snow.as_ref())
        })
        .sum();

    // Worst case of the day rather than the mean.
    let max_pop = group
        .intervals
        .iter()
        .map(|(_, i)| percent(i.pop * 100.0))
        .max()
        .unwrap_or(0);

    let (rep_time, rep) = group
        .intervals
        .iter()
        .find(|(t, _)| t.hour() == 12 && t.minute() == 0 && t.second() == 0)
        .copied()
        .unwrap_or((first_time, first));

    let hour = group.intervals.iter().map(|(t, i)| map_hour(*t, i, utc_offset)).collect();

    Some(ForecastDay {
        date: group.date,
        day: DayWeather {
            maxtemp_c: round1(max_temp),
            maxtemp_f: round1(celsius_to_fahrenheit(max_temp)),
            mintemp_c: round1(min_temp),
            mintemp_f: round1(celsius_to_fahrenheit(min_temp)),
            avgtemp_c: round1(avg_temp),
            avgtemp_f: round1(celsius_to_fahrenheit(avg_temp)),
            maxwind_kph: round1(max_wind),
            totalprecip_mm: round1(total_precip),
            daily_chance_of_rain: max_pop,
            daily_will_it_rain: total_precip > 0.0,
            condition: map_condition(&rep.weather, false),
            uv: estimate_uv(rep.clouds.all, local_hour(rep_time, utc_offset)),
        },
        astro: astro.clone(),
        hour,
    })
}

fn map_hour(time: NaiveDateTime, interval: &OwInterval, utc_offset: i64) -> HourWeather {
    HourWeather {
        time: time.format("%Y-%m-%d %H:%M:%S").to_string(),
        time_epoch: interval.dt,
        temp_c: round1(interval.main.temp),
        temp_f: round1(celsius_to_fahrenheit(interval.main.temp)),
        humidity: interval.main.humidity,
        chance_of_rain: percent(interval.pop * 100.0),
        will_it_rain: OwPrecip::last_three_hours(interval.rain.as_ref()) > 0.0,
        condition: map_condition(&interval.weather, false),
        wind_kph: round1(ms_to_kmh(interval.wind.speed)),
        uv: estimate_uv(interval.clouds.all, local_hour(time, utc_offset)),
    }
}

fn map_current(current: &OwCurrentResponse) -> CurrentWeather {
    let local_hour = DateTime::from_timestamp(current.dt + current.timezone, 0).map(|t| t.hour());
    let is_day = local_hour.is_some_and(|h| DAYTIME_HOURS.contains(&h));
    let cloud = current.clouds.all;

    let wind_kph = ms_to_kmh(current.wind.speed);
    let gust_kph = current.wind.gust.map_or(wind_kph * GUST_FACTOR, ms_to_kmh);
    let precip = OwPrecip::last_hour(current.rain.as_ref()) + OwPrecip::last_hour(current.snow.as_ref());

    CurrentWeather {
        last_updated_epoch: current.dt,
        temp_c: round1(current.main.temp),
        temp_f: round1(celsius_to_fahrenheit(current.main.temp)),
        is_day,
        condition: map_condition(&current.weather, true),
        wind_kph: round1(wind_kph),
        wind_mph: round1(kmh_to_mph(wind_kph)),
        wind_degree: current.wind.deg,
        wind_dir: wind_direction(current.wind.deg).to_string(),
        pressure_mb: current.main.pressure,
        precip_mm: round1(precip),
        humidity: current.main.humidity,
        cloud,
        feelslike_c: round1(current.main.feels_like),
        feelslike_f: round1(celsius_to_fahrenheit(current.main.feels_like)),
        vis_km: round1(current.visibility.unwrap_or(DEFAULT_VISIBILITY_M) / 1000.0),
        uv: local_hour.map_or(0, |h| estimate_uv(cloud, h)),
        gust_kph: round1(gust_kph),
    }
}

fn map_condition(weather: &[OwWeather], with_icon: bool) -> Condition {
    match weather.first() {
        Some(w) => Condition {
            text: condition_text(w.id, &w.description),
            icon: if with_icon && !w.icon.is_empty() {
                format!("https://openweathermap.org/img/wn/{}@2x.png", w.icon)
            } else {
                String::new()
            },
            code: w.id,
        },
        None => Condition { text: "Unknown".to_string(), icon: String::new(), code: 0 },
    }
}

/// Heuristic UV index from cloud cover; 0 outside daytime hours.
pub fn estimate_uv(cloud_cover_pct: u8, local_hour: u32) -> u8 {
    if !DAYTIME_HOURS.contains(&local_hour) {
        return 0;
    }
    round_half_up((11.0 - f64::from(cloud_cover_pct) / 10.0) * 0.7).max(0.0) as u8
}

/// 16-point compass abbreviation for a bearing in degrees.
pub fn wind_direction(degrees: f64) -> &'static str {
    let sector = (round_half_up(degrees / 22.5) as i64).rem_euclid(16) as usize;
    COMPASS_POINTS[sector]
}

/// Canonical phrase for an OpenWeather condition code, falling back to the
/// provider's own description.
pub fn condition_text(code: u32, description: &str) -> String {
    match condition_phrase(code) {
        Some(phrase) => phrase.to_string(),
        None if !description.is_empty() => description.to_string(),
        None => "Unknown".to_string(),
    }
}

fn condition_phrase(code: u32) -> Option<&'static str> {
    let phrase = match code {
        200 => "Thunderstorm with light rain",
        201 => "Thunderstorm with rain",
        202 => "Thunderstorm with heavy rain",
        210 => "Light thunderstorm",
        211 => "Thunderstorm",
        212 => "Heavy thunderstorm",
        221 => "Ragged thunderstorm",
        230 => "Thunderstorm with light drizzle",
        231 => "Thunderstorm with drizzle",
        232 => "Thunderstorm with heavy drizzle",
        300 => "Light drizzle",
        301 => "Drizzle",
        302 => "Heavy drizzle",
        310 => "Light drizzle rain",
        311 => "Drizzle rain",
        312 => "Heavy drizzle rain",
        313 => "Shower rain and drizzle",
        314 => "Heavy shower rain and drizzle",
        321 => "Shower drizzle",
        500 => "Light rain",
        501 => "Moderate rain",
        502 => "Heavy rain",
        503 => "Very heavy rain",
        504 => "Extreme rain",
        511 => "Freezing rain",
        520 => "Light shower rain",
        521 => "Shower rain",
        522 => "Heavy shower rain",
        531 => "Ragged shower rain",
        600 => "Light snow",
        601 => "Snow",
        602 => "Heavy snow",
        611 => "Sleet",
        612 => "Light shower sleet",
        613 => "Shower sleet",
        615 => "Light rain and snow",
        616 => "Rain and snow",
        620 => "Light shower snow",
        621 => "Shower snow",
        622 => "Heavy shower snow",
        701 => "Mist",
        711 => "Smoke",
        721 => "Haze",
        731 => "Dust whirls",
        741 => "Fog",
        751 => "Sand",
        761 => "Dust",
        762 => "Volcanic ash",
        771 => "Squalls",
        781 => "Tornado",
        800 => "Clear sky",
        801 => "Few clouds",
        802 => "Scattered clouds",
        803 => "Broken clouds",
        804 => "Overcast clouds",
        _ => return None,
    };
    Some(phrase)
}

/// `UTC+2`, `UTC-5`, ... from an offset in seconds.
fn timezone_label(offset_secs: i64) -> String {
    let hours = round_half_up(offset_secs as f64 / 3600.0) as i64;
    let sign = if offset_secs >= 0 { "+" } else { "" };
    format!("UTC{sign}{hours}")
}

fn format_clock(ts: i64, offset_secs: i64) -> String {
    if ts == 0 {
        return String::new();
    }
    DateTime::from_timestamp(ts + offset_secs, 0)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{OwClouds, OwCoord, OwMain, OwWind};

    fn interval(dt_txt: &str, temp: f64, pop: f64, clouds: u8) -> OwInterval {
        let dt = NaiveDateTime::parse_from_str(dt_txt, "%Y-%m-%d %H:%M:%S")
            .map(|t| t.and_utc().timestamp())
            .unwrap_or(0);
        OwInterval {
            dt,
            main: OwMain { temp, humidity: 50, ..Default::default() },
            weather: vec![OwWeather {
                id: 800,
                description: "clear sky".into(),
                ..Default::default()
            }],
            clouds: OwClouds { all: clouds },
            wind: OwWind { speed: 5.0, ..Default::default() },
            pop,
            dt_txt: dt_txt.to_string(),
            ..Default::default()
        }
    }

    fn current() -> OwCurrentResponse {
        OwCurrentResponse {
            coord: OwCoord { lat: 52.52, lon: 13.41 },
            weather: vec![OwWeather {
                id: 500,
                description: "light rain".into(),
                icon: "10d".into(),
                ..Default::default()
            }],
            main: OwMain {
                temp: 18.26,
                feels_like: 17.8,
                pressure: 1012.0,
                humidity: 72,
                ..Default::default()
            },
            visibility: None,
            wind: OwWind { speed: 4.1, deg: 200.0, gust: None },
            clouds: OwClouds { all: 40 },
            rain: Some(OwPrecip { one_hour: Some(0.4), three_hours: None }),
            snow: None,
            // 2024-06-01 10:00:00 UTC
            dt: 1_717_236_000,
            timezone: 7200,
            name: "Berlin".into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_intervals_yield_empty_forecast() {
        let data = normalize(&current(), &OwForecastResponse::default(), "Berlin", "DE", None);
        assert!(data.forecast.forecastday.is_empty());
        assert!(data.alerts.alert.is_empty());
        assert_eq!(data.rain_probability(), 0);
    }

    #[test]
    fn groups_by_date_in_first_appearance_order() {
        let intervals = vec![
            interval("2024-06-01 21:00:00", 15.0, 0.0, 0),
            interval("2024-06-02 00:00:00", 14.0, 0.0, 0),
            interval("2024-06-02 03:00:00", 13.0, 0.0, 0),
            interval("2024-06-01 23:00:00", 16.0, 0.0, 0),
        ];
        let days = forecast_days(&intervals, &Astro { sunrise: String::new(), sunset: String::new() }, 0);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(days[0].hour.len(), 2);
        assert_eq!(days[1].hour.len(), 2);
        for day in &days {
            let date = day.date.format("%Y-%m-%d").to_string();
            assert!(day.hour.iter().all(|h| h.time.starts_with(&date)));
        }
    }

    #[test]
    fn keeps_at_most_seven_days() {
        let intervals: Vec<_> = (1..=9)
            .map(|d| interval(&format!("2024-06-{d:02} 12:00:00"), 20.0, 0.1, 10))
            .collect();
        let days = forecast_days(&intervals, &Astro { sunrise: String::new(), sunset: String::new() }, 0);

        assert_eq!(days.len(), MAX_FORECAST_DAYS);
        assert!(days.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn daily_aggregates() {
        let mut wet = interval("2024-06-01 15:00:00", 24.0, 0.8, 90);
        wet.rain = Some(OwPrecip { one_hour: None, three_hours: Some(1.25) });
        wet.snow = Some(OwPrecip { one_hour: None, three_hours: Some(0.5) });
        wet.wind.speed = 10.0;
        let intervals = vec![
            interval("2024-06-01 09:00:00", 12.0, 0.2, 50),
            interval("2024-06-01 12:00:00", 20.0, 0.1, 20),
            wet,
        ];
        let days = forecast_days(&intervals, &Astro { sunrise: String::new(), sunset: String::new() }, 0);
        let day = &days[0].day;

        assert_eq!(day.maxtemp_c, 24.0);
        assert_eq!(day.mintemp_c, 12.0);
        assert_eq!(day.avgtemp_c, 18.7);
        assert!(day.maxtemp_c >= day.avgtemp_c && day.avgtemp_c >= day.mintemp_c);
        assert_eq!(day.maxwind_kph, 36.0);
        assert_eq!(day.totalprecip_mm, 1.8);
        assert!(day.daily_will_it_rain);
        // maximum, not the mean
        assert_eq!(day.daily_chance_of_rain, 80);
        // noon interval is representative: 20% cloud → (11 - 2) * 0.7 = 6.3
        assert_eq!(day.uv, 6);
        assert_eq!(day.condition.text, "Clear sky");
    }

    #[test]
    fn representative_falls_back_to_first_interval() {
        let intervals = vec![
            interval("2024-06-01 18:00:00", 20.0, 0.0, 0),
            interval("2024-06-01 21:00:00", 18.0, 0.0, 0),
        ];
        let days = forecast_days(&intervals, &Astro { sunrise: String::new(), sunset: String::new() }, 0);

        // 18:00 lies outside the daytime window
        assert_eq!(days[0].day.uv, 0);
        assert!(!days[0].day.daily_will_it_rain);
    }

    #[test]
    fn forecast_uv_uses_local_clock() {
        let astro = Astro { sunrise: String::new(), sunset: String::new() };
        // 21:00 UTC is 07:00 at UTC+10
        let intervals = vec![interval("2024-06-01 21:00:00", 20.0, 0.0, 0)];

        let utc = forecast_days(&intervals, &astro, 0);
        assert_eq!(utc[0].day.uv, 0);
        assert_eq!(utc[0].hour[0].uv, 0);

        let sydney = forecast_days(&intervals, &astro, 36_000);
        assert_eq!(sydney[0].day.uv, 8);
        assert_eq!(sydney[0].hour[0].uv, 8);
        assert_eq!(sydney[0].hour[0].time, "2024-06-01 21:00:00");

        // 12:00 UTC is 02:00 at UTC-10
        let noon = vec![interval("2024-06-01 12:00:00", 20.0, 0.0, 0)];
        assert_eq!(forecast_days(&noon, &astro, -36_000)[0].day.uv, 0);
    }

    #[test]
    fn uv_estimate_formula() {
        assert_eq!(estimate_uv(0, 12), 8);
        assert_eq!(estimate_uv(100, 12), 1);
        assert_eq!(estimate_uv(0, 5), 0);
        assert_eq!(estimate_uv(0, 6), 8);
        assert_eq!(estimate_uv(0, 18), 0);
    }

    #[test]
    fn wind_direction_is_cyclic() {
        assert_eq!(wind_direction(0.0), wind_direction(360.0));
        assert_eq!(wind_direction(-22.5), "NNW");
        for (i, point) in COMPASS_POINTS.iter().enumerate() {
            assert_eq!(wind_direction(i as f64 * 22.5), *point);
        }
        assert_eq!(wind_direction(11.0), "N");
        assert_eq!(wind_direction(12.0), "NNE");
        assert_eq!(wind_direction(350.0), "N");
    }

    #[test]
    fn condition_text_fallbacks() {
        assert_eq!(condition_text(741, "fog"), "Fog");
        assert_eq!(condition_text(999, "odd sky"), "odd sky");
        assert_eq!(condition_text(999, ""), "Unknown");
    }

    #[test]
    fn maps_current_conditions() {
        let data = normalize(&current(), &OwForecastResponse::default(), "Berlin", "DE", Some("Berlin"));
        let c = &data.current;

        assert_eq!(data.location.tz_id, "UTC+2");
        assert_eq!(data.location.region, "Berlin");
        assert_eq!(data.location.lat, 52.52);
        assert_eq!(c.temp_c, 18.3);
        assert_eq!(c.temp_f, 64.9);
        assert_eq!(c.condition.text, "Light rain");
        assert_eq!(c.condition.icon, "https://openweathermap.org/img/wn/10d@2x.png");
        assert_eq!(c.wind_kph, 14.8);
        assert_eq!(c.wind_dir, "SSW");
        assert_eq!(c.gust_kph, 22.1);
        assert_eq!(c.vis_km, 10.0);
        assert_eq!(c.precip_mm, 0.4);
        // 12:00 local, 40% cloud → (11 - 4) * 0.7 = 4.9
        assert!(c.is_day);
        assert_eq!(c.uv, 5);
    }

    #[test]
    fn night_time_current_has_no_uv() {
        let mut raw = current();
        raw.timezone = -36_000;
        let data = normalize(&raw, &OwForecastResponse::default(), "Honolulu", "US", None);

        assert_eq!(data.location.tz_id, "UTC-10");
        assert!(!data.current.is_day);
        assert_eq!(data.current.uv, 0);
    }

    #[test]
    fn missing_dt_txt_uses_epoch() {
        let mut raw = interval("2024-06-03 12:00:00", 20.0, 0.0, 0);
        raw.dt_txt.clear();
        let days = forecast_days(&[raw], &Astro { sunrise: String::new(), sunset: String::new() }, 0);

        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(days[0].hour[0].time, "2024-06-03 12:00:00");
    }
}
