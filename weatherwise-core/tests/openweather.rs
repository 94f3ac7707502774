//! OpenWeather provider against a mock HTTP server.

mod common;

use common::{current_response, forecast_response, geocoding_response};
use weatherwise_core::{WeatherProvider, provider::openweather::OpenWeatherProvider};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

async fn mount_weather(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_response()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_response()))
        .mount(server)
        .await;
}

fn provider(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::with_base_url("KEY".to_string(), &server.uri())
}

#[tokio::test]
async fn weather_by_location_normalizes_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Lisbon"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocoding_response()))
        .mount(&server)
        .await;
    mount_weather(&server).await;

    let data = provider(&server).weather_by_location("Lisbon").await.unwrap();

    assert_eq!(data.location.name, "Lisbon");
    assert_eq!(data.location.region, "Lisbon");
    assert_eq!(data.location.country, "PT");
    assert_eq!(data.location.tz_id, "UTC+1");

    assert_eq!(data.current.temp_c, 18.0);
    assert_eq!(data.current.wind_kph, 18.0);
    assert_eq!(data.current.wind_dir, "E");
    assert_eq!(data.current.condition.text, "Few clouds");
    assert!(data.current.is_day);
    assert_eq!(data.current.vis_km, 10.0);

    assert_eq!(data.forecast.forecastday.len(), 2);
    let first = &data.forecast.forecastday[0];
    assert_eq!(first.day.maxtemp_c, 21.0);
    assert_eq!(first.day.mintemp_c, 17.0);
    assert_eq!(first.day.daily_chance_of_rain, 40);
    assert_eq!(first.hour.len(), 2);
    assert_eq!(data.rain_probability(), 40);
}

#[tokio::test]
async fn unknown_location_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let err = provider(&server).weather_by_location("Atlantis").await.unwrap_err();

    assert!(err.to_string().contains("Location not found: Atlantis"));
}

#[tokio::test]
async fn http_errors_carry_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let err = provider(&server).weather_by_coords(1.0, 2.0).await.unwrap_err();
    let message = err.to_string();

    assert!(message.contains("401"), "{message}");
    assert!(message.contains("Invalid API key"), "{message}");
}

#[tokio::test]
async fn reverse_geocoding_failure_keeps_payload_name() {
    let server = MockServer::start().await;
    mount_weather(&server).await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/reverse"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let data = provider(&server).weather_by_coords(38.72, -9.14).await.unwrap();

    assert_eq!(data.location.name, "Lisbon");
    assert_eq!(data.location.country, "PT");
}

#[tokio::test]
async fn reverse_geocoding_improves_name() {
    let server = MockServer::start().await;
    mount_weather(&server).await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Belém", "lat": 38.69, "lon": -9.21, "country": "PT", "state": "Lisbon" }
        ])))
        .mount(&server)
        .await;

    let data = provider(&server).weather_by_coords(38.69, -9.21).await.unwrap();

    assert_eq!(data.location.name, "Belém");
    assert_eq!(data.location.region, "Lisbon");
}

#[tokio::test]
async fn search_failure_yields_no_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(provider(&server).search_locations("Lis").await.is_empty());
}

#[tokio::test]
async fn search_returns_indexed_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Lisbon", "lat": 38.72, "lon": -9.14, "country": "PT" },
            { "name": "Lisbon", "lat": 44.03, "lon": -70.10, "country": "US", "state": "Maine" }
        ])))
        .mount(&server)
        .await;

    let matches = provider(&server).search_locations("Lisbon").await;

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[1].id, 1);
    assert_eq!(matches[1].region, "Maine");
    assert_eq!(matches[0].url, "Lisbon, PT");
}
