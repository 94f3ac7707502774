//! Core library for the `weatherwise` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider and normalization into a canonical snapshot
//! - Weather insights, from a generative model or from fixed rules
//! - Persistence of profiles, locations, history and reviews
//!
//! It is used by `weatherwise-cli`, but can also be reused by other binaries or services.

pub mod backend;
pub mod config;
pub mod insight;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod raw;
pub mod session;
pub mod state;
pub mod units;

#[cfg(test)]
mod fixtures;

pub use backend::{BackendError, SupabaseClient, UserDataStore, ValidationError};
pub use config::{Config, ServiceConfig, ServiceId};
pub use insight::{
    InsightError, InsightProvider, InsightResult,
    service::{Insight, InsightService, InsightSource},
};
pub use model::{LocationMatch, WeatherData};
pub use provider::WeatherProvider;
pub use session::WeatherSession;
pub use state::WeatherState;
pub use units::TemperatureUnit;
