//! Row types of the hosted tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{insight::InsightResult, model::WeatherData};

use super::ValidationError;

/// PostgREST returns `null` for unset columns; treat it like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllergySeverity {
    Mild,
    #[default]
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperaturePreference {
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub email: bool,
    pub allergy_alerts: bool,
    pub weather_updates: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self { email: true, allergy_alerts: true, weather_updates: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allergies: Vec<String>,
    pub allergy_severity: Option<AllergySeverity>,
    pub temperature_preference: Option<TemperaturePreference>,
    pub notification_preferences: Option<NotificationPreferences>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: String,
    pub allergies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewProfile {
    /// Default row for a user seen for the first time. The name falls back
    /// to the email's local part, then to `"User"`.
    pub fn with_defaults(
        id: &str,
        email: Option<&str>,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let name = display_name
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .or_else(|| {
                email
                    .and_then(|e| e.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "User".to_string());

        Self {
            id: id.to_string(),
            email: email.map(str::to_string),
            name,
            allergies: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergy_severity: Option<AllergySeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_preference: Option<TemperaturePreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_preferences: Option<NotificationPreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_favorite: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSavedLocation {
    pub user_id: String,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub is_favorite: bool,
}

impl NewSavedLocation {
    pub fn from_snapshot(user_id: &str, snapshot: &WeatherData) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: snapshot.location.name.clone(),
            country: snapshot.location.country.clone(),
            lat: snapshot.location.lat,
            lon: snapshot.location.lon,
            is_favorite: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SavedLocationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherHistoryEntry {
    pub id: String,
    pub user_id: String,
    pub location_name: String,
    pub lat: f64,
    pub lon: f64,
    pub temperature: f64,
    pub condition: String,
    pub humidity: Option<u8>,
    pub wind_kph: Option<f64>,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWeatherHistory {
    pub user_id: String,
    pub location_name: String,
    pub lat: f64,
    pub lon: f64,
    pub temperature: f64,
    pub condition: String,
    pub humidity: u8,
    pub wind_kph: f64,
    pub searched_at: DateTime<Utc>,
}

impl NewWeatherHistory {
    pub fn from_snapshot(user_id: &str, snapshot: &WeatherData, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            location_name: snapshot.location.name.clone(),
            lat: snapshot.location.lat,
            lon: snapshot.location.lon,
            temperature: snapshot.current.temp_c,
            condition: snapshot.current.condition.text.clone(),
            humidity: snapshot.current.humidity,
            wind_kph: snapshot.current.wind_kph,
            searched_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInsight {
    pub id: String,
    pub user_id: String,
    pub location_name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub insight: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
    pub rain_probability: Option<u8>,
    pub allergy_alert: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStoredInsight {
    pub user_id: String,
    pub location_name: String,
    pub lat: f64,
    pub lon: f64,
    pub insight: String,
    pub suggestions: Vec<String>,
    pub rain_probability: Option<u8>,
    pub allergy_alert: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewStoredInsight {
    /// A zero rain probability is stored as NULL.
    pub fn new(
        user_id: &str,
        location: &str,
        snapshot: &WeatherData,
        result: &InsightResult,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            location_name: location.to_string(),
            lat: snapshot.location.lat,
            lon: snapshot.location.lon,
            insight: result.insight.clone(),
            suggestions: result.suggestions.clone(),
            rain_probability: (result.rain_probability > 0).then_some(result.rain_probability),
            allergy_alert: result.allergy_alert.clone(),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub rating: u8,
    pub title: Option<String>,
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_approved: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_featured: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// User-submitted testimonial, validated before it is stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestimonialSubmission {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub rating: u8,
    pub title: Option<String>,
    pub content: String,
}

impl TestimonialSubmission {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&[
            ("user_id", &self.user_id),
            ("user_name", &self.user_name),
            ("user_email", &self.user_email),
            ("content", &self.content),
        ])?;
        check_rating(self.rating)
    }
}

/// Row written for a submission; new testimonials wait for approval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTestimonial {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub rating: u8,
    pub title: Option<String>,
    pub content: String,
    pub is_approved: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

impl NewTestimonial {
    pub fn from_submission(
        submission: &TestimonialSubmission,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        submission.validate()?;
        Ok(Self {
            user_id: submission.user_id.clone(),
            user_name: submission.user_name.clone(),
            user_email: submission.user_email.clone(),
            rating: submission.rating,
            title: submission.title.clone().filter(|t| !t.trim().is_empty()),
            content: submission.content.trim().to_string(),
            is_approved: false,
            is_featured: false,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TestimonialUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TestimonialUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.rating.map_or(Ok(()), check_rating)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_email: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewSubmission {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub rating: u8,
    pub comment: String,
}

impl ReviewSubmission {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&[
            ("user_id", &self.user_id),
            ("user_name", &self.user_name),
            ("comment", &self.comment),
        ])?;
        check_rating(self.rating)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReview {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewReview {
    pub fn from_submission(
        submission: &ReviewSubmission,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        submission.validate()?;
        Ok(Self {
            user_id: submission.user_id.clone(),
            user_name: submission.user_name.clone(),
            user_email: submission.user_email.clone(),
            rating: submission.rating,
            comment: submission.comment.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReviewUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReviewUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(comment) = &self.comment {
            require(&[("comment", comment)])?;
        }
        self.rating.map_or(Ok(()), check_rating)
    }
}

fn require(fields: &[(&'static str, &String)]) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() { Ok(()) } else { Err(ValidationError::MissingFields(missing)) }
}

fn check_rating(rating: u8) -> Result<(), ValidationError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ValidationError::RatingOutOfRange(rating))
    }
}
