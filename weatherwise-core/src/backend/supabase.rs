use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};

use super::{
    BackendError, NewProfile, NewReview, NewSavedLocation, NewStoredInsight, NewTestimonial,
    NewWeatherHistory, ProfileUpdate, Review, ReviewSubmission, ReviewUpdate, SavedLocation,
    SavedLocationUpdate, StoredInsight, Testimonial, TestimonialSubmission, TestimonialUpdate,
    UserDataStore, UserProfile, WeatherHistoryEntry,
};

const USERS: &str = "users";
const SAVED_LOCATIONS: &str = "saved_locations";
const WEATHER_HISTORY: &str = "weather_history";
const AI_INSIGHTS: &str = "ai_insights";
const TESTIMONIALS: &str = "testimonials";
const REVIEWS: &str = "reviews";

const HISTORY_LIMIT: usize = 100;
const INSIGHTS_LIMIT: usize = 50;

type Filters<'a> = [(&'a str, String)];

fn eq(value: impl ToString) -> String {
    format!("eq.{}", value.to_string())
}

fn newest_first() -> (&'static str, String) {
    ("order", "created_at.desc".to_string())
}

/// PostgREST client for the hosted tables.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, api_key: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            access_token: None,
        }
    }

    /// Acts on behalf of a signed-in user instead of the anonymous role.
    pub fn with_access_token(mut self, token: String) -> Self {
        self.access_token = Some(token);
        self
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.http
            .request(method, format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    async fn send(req: RequestBuilder) -> Result<String, BackendError> {
        let res = req.send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(BackendError::Status { status: status.as_u16(), body });
        }
        Ok(body)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &Filters<'_>,
    ) -> Result<Vec<T>, BackendError> {
        let req = self.request(Method::GET, table).query(&[("select", "*")]).query(filters);
        let body = Self::send(req).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &'static str,
        row: &B,
    ) -> Result<T, BackendError> {
        let req = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(row);
        first_row(table, &Self::send(req).await?)
    }

    async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &'static str,
        id: &str,
        changes: &B,
    ) -> Result<T, BackendError> {
        let req = self
            .request(Method::PATCH, table)
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(changes);
        first_row(table, &Self::send(req).await?)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError> {
        let req = self.request(Method::DELETE, table).query(&[("id", eq(id))]);
        Self::send(req).await?;
        tracing::debug!(table, id, "row deleted");
        Ok(())
    }

    // users

    pub async fn find_user(&self, id: &str) -> Result<Option<UserProfile>, BackendError> {
        let rows = self.select(USERS, &[("id", eq(id))]).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, BackendError> {
        let rows = self.select(USERS, &[("email", eq(email))]).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn create_user(&self, profile: &NewProfile) -> Result<UserProfile, BackendError> {
        self.insert(USERS, profile).await
    }

    pub async fn update_user(
        &self,
        id: &str,
        changes: &ProfileUpdate,
    ) -> Result<UserProfile, BackendError> {
        let changes = ProfileUpdate { updated_at: Some(Utc::now()), ..changes.clone() };
        self.update(USERS, id, &changes).await
    }

    /// Returns the stored profile, creating one with default fields the first
    /// time a user is seen.
    pub async fn get_or_create_profile(
        &self,
        id: &str,
        email: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<UserProfile, BackendError> {
        if let Some(profile) = self.find_user(id).await? {
            return Ok(profile);
        }

        tracing::info!(user_id = id, "creating profile");
        self.create_user(&NewProfile::with_defaults(id, email, display_name, Utc::now()))
            .await
    }

    // saved locations

    pub async fn create_location(
        &self,
        location: &NewSavedLocation,
    ) -> Result<SavedLocation, BackendError> {
        self.insert(SAVED_LOCATIONS, location).await
    }

    pub async fn locations(&self, user_id: &str) -> Result<Vec<SavedLocation>, BackendError> {
        self.select(SAVED_LOCATIONS, &[("user_id", eq(user_id)), newest_first()])
            .await
    }

    pub async fn favorite_locations(
        &self,
        user_id: &str,
    ) -> Result<Vec<SavedLocation>, BackendError> {
        self.select(SAVED_LOCATIONS, &[("user_id", eq(user_id)), ("is_favorite", eq(true))])
            .await
    }

    pub async fn update_location(
        &self,
        id: &str,
        changes: &SavedLocationUpdate,
    ) -> Result<SavedLocation, BackendError> {
        self.update(SAVED_LOCATIONS, id, changes).await
    }

    pub async fn delete_location(&self, id: &str) -> Result<(), BackendError> {
        self.delete(SAVED_LOCATIONS, id).await
    }

    /// Flips the favorite flag of a stored location.
    pub async fn toggle_favorite(&self, id: &str) -> Result<SavedLocation, BackendError> {
        let current: SavedLocation = self
            .select(SAVED_LOCATIONS, &[("id", eq(id))])
            .await?
            .into_iter()
            .next()
            .ok_or(BackendError::EmptyResponse(SAVED_LOCATIONS))?;

        let changes = SavedLocationUpdate { is_favorite: Some(!current.is_favorite), ..Default::default() };
        self.update_location(id, &changes).await
    }

    // weather history

    pub async fn create_history(
        &self,
        entry: &NewWeatherHistory,
    ) -> Result<WeatherHistoryEntry, BackendError> {
        self.insert(WEATHER_HISTORY, entry).await
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<WeatherHistoryEntry>, BackendError> {
        self.select(
            WEATHER_HISTORY,
            &[
                ("user_id", eq(user_id)),
                ("order", "searched_at.desc".into()),
                ("limit", HISTORY_LIMIT.to_string()),
            ],
        )
        .await
    }

    pub async fn delete_history(&self, id: &str) -> Result<(), BackendError> {
        self.delete(WEATHER_HISTORY, id).await
    }

    // insights

    pub async fn create_insight(
        &self,
        insight: &NewStoredInsight,
    ) -> Result<StoredInsight, BackendError> {
        self.insert(AI_INSIGHTS, insight).await
    }

    pub async fn insights(&self, user_id: &str) -> Result<Vec<StoredInsight>, BackendError> {
        self.select(
            AI_INSIGHTS,
            &[
                ("user_id", eq(user_id)),
                newest_first(),
                ("limit", INSIGHTS_LIMIT.to_string()),
            ],
        )
        .await
    }

    pub async fn delete_insight(&self, id: &str) -> Result<(), BackendError> {
        self.delete(AI_INSIGHTS, id).await
    }

    // testimonials

    /// Validates first; an invalid submission never reaches the network.
    pub async fn create_testimonial(
        &self,
        submission: &TestimonialSubmission,
    ) -> Result<Testimonial, BackendError> {
        let row = NewTestimonial::from_submission(submission, Utc::now())?;
        self.insert(TESTIMONIALS, &row).await
    }

    pub async fn approved_testimonials(&self) -> Result<Vec<Testimonial>, BackendError> {
        self.select(TESTIMONIALS, &[("is_approved", eq(true)), newest_first()])
            .await
    }

    pub async fn featured_testimonials(&self) -> Result<Vec<Testimonial>, BackendError> {
        self.select(
            TESTIMONIALS,
            &[
                ("is_approved", eq(true)),
                ("is_featured", eq(true)),
                newest_first(),
            ],
        )
        .await
    }

    pub async fn user_testimonials(&self, user_id: &str) -> Result<Vec<Testimonial>, BackendError> {
        self.select(TESTIMONIALS, &[("user_id", eq(user_id)), newest_first()])
            .await
    }

    pub async fn testimonial(&self, id: &str) -> Result<Option<Testimonial>, BackendError> {
        let rows = self.select(TESTIMONIALS, &[("id", eq(id))]).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn update_testimonial(
        &self,
        id: &str,
        changes: &TestimonialUpdate,
    ) -> Result<Testimonial, BackendError> {
        changes.validate()?;
        let changes = TestimonialUpdate { updated_at: Some(Utc::now()), ..changes.clone() };
        self.update(TESTIMONIALS, id, &changes).await
    }

    pub async fn delete_testimonial(&self, id: &str) -> Result<(), BackendError> {
        self.delete(TESTIMONIALS, id).await
    }

    // reviews

    pub async fn create_review(&self, submission: &ReviewSubmission) -> Result<Review, BackendError> {
        let row = NewReview::from_submission(submission, Utc::now())?;
        self.insert(REVIEWS, &row).await
    }

    pub async fn reviews(&self) -> Result<Vec<Review>, BackendError> {
        self.select(REVIEWS, &[newest_first()]).await
    }

    pub async fn user_reviews(&self, user_id: &str) -> Result<Vec<Review>, BackendError> {
        self.select(REVIEWS, &[("user_id", eq(user_id)), newest_first()])
            .await
    }

    pub async fn update_review(&self, id: &str, changes: &ReviewUpdate) -> Result<Review, BackendError> {
        changes.validate()?;
        let changes = ReviewUpdate {
            comment: changes.comment.as_deref().map(|c| c.trim().to_string()),
            updated_at: Some(Utc::now()),
            ..changes.clone()
        };
        self.update(REVIEWS, id, &changes).await
    }

    pub async fn delete_review(&self, id: &str) -> Result<(), BackendError> {
        self.delete(REVIEWS, id).await
    }
}

fn first_row<T: DeserializeOwned>(table: &'static str, body: &str) -> Result<T, BackendError> {
    let rows: Vec<T> = serde_json::from_str(body)?;
    rows.into_iter().next().ok_or(BackendError::EmptyResponse(table))
}

#[async_trait]
impl UserDataStore for SupabaseClient {
    async fn user_allergies(&self, user_id: &str) -> Result<Vec<String>, BackendError> {
        Ok(self.find_user(user_id).await?.map(|p| p.allergies).unwrap_or_default())
    }

    async fn record_weather(&self, entry: &NewWeatherHistory) -> Result<(), BackendError> {
        self.create_history(entry).await.map(|_| ())
    }

    async fn save_insight(&self, insight: &NewStoredInsight) -> Result<(), BackendError> {
        self.create_insight(insight).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_row_reports_empty_table() {
        let err = first_row::<serde_json::Value>("reviews", "[]").unwrap_err();
        assert!(matches!(err, BackendError::EmptyResponse("reviews")));

        let row: serde_json::Value = first_row("reviews", r#"[{"id":"1"},{"id":"2"}]"#).unwrap();
        assert_eq!(row["id"], "1");
    }

    #[test]
    fn filters_use_postgrest_operators() {
        assert_eq!(eq("abc"), "eq.abc");
        assert_eq!(eq(true), "eq.true");
    }

    #[test]
    fn base_url_is_normalized() {
        let client = SupabaseClient::new("https://proj.supabase.co/", "anon".into());
        assert_eq!(client.base_url, "https://proj.supabase.co");
        assert!(client.access_token.is_none());

        let client = client.with_access_token("jwt".into());
        assert_eq!(client.access_token.as_deref(), Some("jwt"));
    }
}
