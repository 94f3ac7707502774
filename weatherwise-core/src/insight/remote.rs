//! Gemini-backed insights.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::model::WeatherData;

use super::{InsightError, InsightProvider, InsightResult, MAX_SUGGESTIONS};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-pro";

#[derive(Debug, Clone)]
pub struct RemoteInsightProvider {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

/// Shape the model is asked to answer with.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInsight {
    insight: Option<String>,
    suggestions: Option<Vec<String>>,
    allergy_alert: Option<String>,
    personalized_allergy_alert: Option<String>,
}

impl RemoteInsightProvider {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate_text(&self, prompt: &str) -> Result<String, InsightError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let payload = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::HttpStatus { status: status.as_u16(), body });
        }

        let body: Value = response.json().await?;
        extract_text(&body)
    }
}

#[async_trait]
impl InsightProvider for RemoteInsightProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(
        &self,
        snapshot: &WeatherData,
        location: &str,
        allergies: &[String],
    ) -> Result<InsightResult, InsightError> {
        let prompt = insight_prompt(snapshot, location, allergies);
        let text = self.generate_text(&prompt).await?;
        let result = parse_insight(&text, snapshot)?;

        tracing::info!(
            personalized = result.personalized_allergy_alert.is_some(),
            "model insight generated"
        );
        Ok(result)
    }

    async fn activities(
        &self,
        snapshot: &WeatherData,
        location: &str,
    ) -> Result<Vec<String>, InsightError> {
        let text = self.generate_text(&activities_prompt(snapshot, location)).await?;
        let block = json_block(&text, '[', ']').ok_or(InsightError::NoJson)?;
        Ok(serde_json::from_str(block)?)
    }
}

/// Concatenated text parts of the first candidate.
fn extract_text(body: &Value) -> Result<String, InsightError> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or(InsightError::EmptyResponse)?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.trim().is_empty() {
        return Err(InsightError::EmptyResponse);
    }
    Ok(text)
}

/// Outermost `open … close` span; tolerates markdown fences and chatter.
fn json_block(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn parse_insight(text: &str, snapshot: &WeatherData) -> Result<InsightResult, InsightError> {
    let block = json_block(text, '{', '}').ok_or(InsightError::NoJson)?;
    let parsed: ModelInsight = serde_json::from_str(block)?;

    let insight = parsed
        .insight
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| InsightError::InvalidShape("missing `insight`".into()))?;
    let mut suggestions = parsed
        .suggestions
        .ok_or_else(|| InsightError::InvalidShape("missing `suggestions` array".into()))?;
    suggestions.truncate(MAX_SUGGESTIONS);

    Ok(InsightResult {
        insight,
        suggestions,
        rain_probability: snapshot.rain_probability(),
        allergy_alert: parsed.allergy_alert.filter(|s| !s.trim().is_empty()),
        personalized_allergy_alert: parsed.personalized_allergy_alert.filter(|s| !s.trim().is_empty()),
    })
}

pub fn insight_prompt(snapshot: &WeatherData, location: &str, allergies: &[String]) -> String {
    let c = &snapshot.current;
    let personalized = !allergies.is_empty();

    let mut tasks = vec![
        format!(
            "You are a friendly weather assistant with expertise in health and allergies. \
             Analyze the following weather data for {location} and provide:"
        ),
        "1. A brief, insightful description of the current weather (2-3 sentences)".to_string(),
        "2. 4-6 practical suggestions based on the weather conditions".to_string(),
        "3. General allergy risk assessment based on weather conditions".to_string(),
    ];
    if personalized {
        tasks.push("4. Personalized allergy alert for the user's specific allergies".to_string());
    }

    let mut data = vec![
        format!("- Current Temperature: {}°C (feels like {}°C)", c.temp_c, c.feelslike_c),
        format!("- Condition: {}", c.condition.text),
        format!("- Humidity: {}%", c.humidity),
        format!("- Wind Speed: {} km/h", c.wind_kph),
        format!("- Wind Direction: {}", c.wind_dir),
        format!("- Visibility: {} km", c.vis_km),
        format!("- UV Index (estimated): {}", c.uv),
        format!("- Cloud Coverage: {}%", c.cloud),
        format!("- Precipitation: {} mm", c.precip_mm),
    ];
    if let Some(today) = snapshot.today() {
        data.push(format!("- High/Low Today: {}°C / {}°C", today.day.maxtemp_c, today.day.mintemp_c));
        if today.day.daily_chance_of_rain > 0 {
            data.push(format!("- Chance of Rain: {}%", today.day.daily_chance_of_rain));
        }
    }

    let mut prompt = format!("{}\n\nWeather Data:\n{}\n", tasks.join("\n"), data.join("\n"));

    prompt.push_str(
        "\nGeneral allergy risk factors to consider:\n\
         - Pollen levels (high on warm, dry, windy days with temps 15-25°C)\n\
         - Mold risk (high humidity >70%, recent rain)\n\
         - Air quality indicators (visibility, wind patterns)\n\
         - Seasonal factors\n",
    );

    if personalized {
        prompt.push_str(&format!(
            "\nIMPORTANT - Personalized Allergy Analysis:\n\
             The user has the following allergies: {}.\n\
             Please provide a specific \"personalizedAllergyAlert\" field analyzing how these weather conditions may affect their specific allergies:\n\
             - For pollen allergies: Consider temperature (15-25°C ideal for pollen), wind speed (high wind spreads pollen), humidity (low humidity increases pollen), and clear/sunny conditions\n\
             - For mold allergies: Consider high humidity (>70%), recent precipitation, damp conditions\n\
             - For grass allergies: Consider warm temperatures, dry conditions, wind\n\
             - For tree_pollen/ragweed: Consider seasonal factors, wind, dry conditions\n\
             - For dust allergies: Consider dry, windy conditions\n\
             - For pollution sensitivity: Consider visibility, wind patterns, cloud cover\n\
             - For humidity sensitivity: Consider high humidity levels\n\n\
             Provide specific, actionable advice for their allergies.\n",
            allergies.join(", ")
        ));
    }

    prompt.push_str(
        "\nPlease provide your response in the following JSON format only (no markdown, no code blocks, just pure JSON):\n\
         {\n  \"insight\": \"A friendly, informative description of the weather with context and what it means for the day\",\n  \
         \"suggestions\": [\"practical suggestion 1\", \"practical suggestion 2\", \"practical suggestion 3\", \"practical suggestion 4\"],\n  \
         \"allergyAlert\": \"Brief general allergy risk assessment: none/low/moderate/high with reason, or null if no risk\"",
    );
    if personalized {
        prompt.push_str(
            ",\n  \"personalizedAllergyAlert\": \"Specific alert for the user's allergies with actionable advice\"",
        );
    }
    prompt.push_str("\n}\n\nImportant: Return ONLY the JSON object, nothing else.");

    prompt
}

pub fn activities_prompt(snapshot: &WeatherData, location: &str) -> String {
    let c = &snapshot.current;
    format!(
        "Based on the following weather in {location}, suggest 4-6 indoor and outdoor activities that would be ideal:\n\n\
         Temperature: {}°C\n\
         Condition: {}\n\
         Humidity: {}%\n\
         Wind Speed: {} km/h\n\
         UV Index: {}\n\n\
         Provide ONLY a JSON array of activity suggestions (no markdown, no code blocks):\n\
         [\"activity 1\", \"activity 2\", \"activity 3\", \"activity 4\"]",
        c.temp_c, c.condition.text, c.humidity, c.wind_kph, c.uv
    )
}
