//! Human-readable output.

use weatherwise_core::{
    Insight, InsightSource, LocationMatch, TemperatureUnit, WeatherData,
    backend::{Review, SavedLocation, Testimonial, UserProfile},
    units::{format_temperature, kmh_to_mph, round_half_up},
};

/// Joins rendered lines, each terminated by a newline.
fn lines<I>(rows: I) -> String
where
    I: IntoIterator<Item = String>,
{
    rows.into_iter().map(|line| line + "\n").collect()
}

pub fn weather(data: &WeatherData, unit: TemperatureUnit, days: usize) -> String {
    let loc = &data.location;
    let c = &data.current;

    let mut place = loc.name.clone();
    if !loc.region.is_empty() && loc.region != loc.name {
        place.push_str(&format!(", {}", loc.region));
    }
    if !loc.country.is_empty() {
        place.push_str(&format!(", {}", loc.country));
    }

    let mut out = vec![
        format!("{place} ({})", loc.tz_id),
        format!(
            "{}, {} (feels like {})",
            c.condition.text,
            format_temperature(c.temp_c, unit, 0),
            format_temperature(c.feelslike_c, unit, 0),
        ),
        format!(
            "Humidity {}%  Wind {} {}  UV {}  Visibility {} km",
            c.humidity,
            wind(c.wind_kph, unit),
            c.wind_dir,
            c.uv,
            c.vis_km,
        ),
        format!("Pressure {} hPa  Precipitation {} mm", c.pressure_mb, c.precip_mm),
    ];

    if let Some(today) = data.today() {
        out.push(format!("Sunrise {}  Sunset {}", today.astro.sunrise, today.astro.sunset));
    }

    if days > 0 && !data.forecast.forecastday.is_empty() {
        out.push("\nForecast".to_string());
        out.extend(data.forecast.forecastday.iter().take(days).map(|day| {
            format!(
                "  {}  {:<22} {} / {}  rain {}%",
                day.date.format("%a %d %b"),
                day.day.condition.text,
                format_temperature(day.day.mintemp_c, unit, 0),
                format_temperature(day.day.maxtemp_c, unit, 0),
                day.day.daily_chance_of_rain,
            )
        }));
    }

    out.extend(
        data.alerts.alert.iter().map(|alert| format!("\n! {} ({})", alert.headline, alert.severity)),
    );
    lines(out)
}

fn wind(kph: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Celsius => format!("{} km/h", round_half_up(kph)),
        TemperatureUnit::Fahrenheit => format!("{} mph", round_half_up(kmh_to_mph(kph))),
    }
}

pub fn matches(matches: &[LocationMatch]) -> String {
    if matches.is_empty() {
        return "No matching locations.\n".to_string();
    }

    lines(matches.iter().map(|m| {
        let region = if m.region.is_empty() { String::new() } else { format!(", {}", m.region) };
        format!("{}{region}, {}  ({:.2}, {:.2})", m.name, m.country, m.lat, m.lon)
    }))
}

pub fn insight(insight: &Insight) -> String {
    let r = &insight.result;
    let source = match insight.source {
        InsightSource::Remote => "model",
        InsightSource::RuleBased => "built-in rules",
    };

    let mut out = vec![format!("{}\n", r.insight)];
    if !r.suggestions.is_empty() {
        out.push("Suggestions:".to_string());
        out.extend(r.suggestions.iter().enumerate().map(|(i, s)| format!("  {}. {s}", i + 1)));
    }
    out.push(format!("Rain probability: {}%", r.rain_probability));
    if let Some(alert) = &r.allergy_alert {
        out.push(format!("Allergy alert: {alert}"));
    }
    if let Some(alert) = &r.personalized_allergy_alert {
        out.push(format!("For you: {alert}"));
    }
    out.push(format!("(source: {source})"));
    lines(out)
}

pub fn activities(list: &[String]) -> String {
    lines(list.iter().map(|a| format!("- {a}")))
}

pub fn saved_locations(list: &[SavedLocation]) -> String {
    if list.is_empty() {
        return "No saved locations.\n".to_string();
    }

    lines(list.iter().map(|loc| {
        let star = if loc.is_favorite { "*" } else { " " };
        format!("{star} {}  {}, {}", loc.id, loc.name, loc.country)
    }))
}

pub fn profile(profile: &UserProfile) -> String {
    let mut out = vec![
        format!("Name:      {}", profile.name.as_deref().unwrap_or("-")),
        format!("Email:     {}", profile.email.as_deref().unwrap_or("-")),
    ];
    if let Some(location) = &profile.location {
        out.push(format!("Location:  {location}"));
    }
    let allergies = if profile.allergies.is_empty() {
        "none".to_string()
    } else {
        profile.allergies.join(", ")
    };
    out.push(format!("Allergies: {allergies}"));
    lines(out)
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub fn reviews(list: &[Review]) -> String {
    if list.is_empty() {
        return "No reviews yet.\n".to_string();
    }
    lines(list.iter().map(|r| format!("{} {}: {}", stars(r.rating), r.user_name, r.comment)))
}

pub fn testimonials(list: &[Testimonial]) -> String {
    if list.is_empty() {
        return "No testimonials yet.\n".to_string();
    }

    lines(list.iter().flat_map(|t| {
        let heading = match &t.title {
            Some(title) => format!("{} {title} by {}", stars(t.rating), t.user_name),
            None => format!("{} {}", stars(t.rating), t.user_name),
        };
        [heading, format!("    {}", t.content)]
    }))
}
