use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use weatherwise_core::{
    Config, InsightService, ServiceId, SupabaseClient, TemperatureUnit, WeatherProvider,
    WeatherSession, WeatherState,
    backend::{
        NewSavedLocation, ProfileUpdate, ReviewSubmission, TestimonialSubmission, UserProfile,
        backend_from_config,
    },
    insight::Allergy,
    provider::provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherwise", version, about = "Weather, forecasts and insights from the terminal")]
pub struct Cli {
    /// More log output (-v, -vv). RUST_LOG overrides this.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a service.
    Configure {
        /// Service short name: "openweather", "gemini" or "supabase".
        service: String,
    },

    /// Show current weather and forecast.
    Show {
        #[command(flatten)]
        target: Target,

        /// Temperature unit, C or F; defaults to the configured one.
        #[arg(long, value_parser = parse_unit)]
        unit: Option<TemperatureUnit>,

        /// Forecast days to print.
        #[arg(long, default_value_t = 5)]
        days: usize,

        /// Print the canonical snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Suggest locations matching a partial name.
    Search { query: String },

    /// Plain-language insight and suggestions for a location.
    Insight {
        #[command(flatten)]
        target: Target,

        /// Allergy to personalize for; repeatable. Defaults to the profile's.
        #[arg(long = "allergy")]
        allergies: Vec<String>,

        /// Skip the model and use the built-in rules.
        #[arg(long)]
        offline: bool,

        #[arg(long)]
        json: bool,
    },

    /// Activity ideas for the current weather.
    Activities {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        offline: bool,
    },

    /// Manage saved locations.
    Locations {
        #[command(subcommand)]
        action: LocationsAction,
    },

    /// Show or edit the stored profile.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Submit or list app reviews.
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },

    /// Submit or list testimonials.
    Testimonial {
        #[command(subcommand)]
        action: TestimonialAction,
    },
}

/// Where to look up weather: an address, or a coordinate pair.
#[derive(Debug, Args)]
pub struct Target {
    /// Address or location name.
    pub address: Option<String>,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum LocationsAction {
    /// List saved locations, newest first.
    List {
        #[arg(long)]
        favorites: bool,
    },
    /// Look up a location and save it.
    Add { address: String },
    Remove { id: String },
    /// Toggle the favorite flag.
    Favorite { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    Show,
    /// Replace the stored allergy list.
    Allergies { allergies: Vec<String> },
}

#[derive(Debug, Subcommand)]
pub enum ReviewAction {
    Submit {
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: String,
        /// Display name; defaults to the profile name.
        #[arg(long)]
        name: Option<String>,
    },
    List {
        /// Only reviews written by this user.
        #[arg(long)]
        mine: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum TestimonialAction {
    Submit {
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        content: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    List {
        #[arg(long)]
        featured: bool,
    },
}

fn parse_unit(value: &str) -> Result<TemperatureUnit, String> {
    TemperatureUnit::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?.with_env_overrides();

        match self.command {
            Command::Configure { service } => configure(&service)?,
            Command::Show { target, unit, days, json } => {
                let mut session = open_session(&mut config)?;
                if let Some(unit) = unit {
                    session.state_mut().set_temperature_unit(unit);
                }
                load_weather(&mut session, &target).await?;

                let data = session.weather().ok_or_else(|| anyhow!("No weather data loaded"))?;
                if json {
                    println!("{}", serde_json::to_string_pretty(data)?);
                } else {
                    print!("{}", render::weather(data, session.state().temperature_unit, days));
                }
            }
            Command::Search { query } => {
                let mut session = open_session(&mut config)?;
                let matches = session.suggest(&query).await;
                print!("{}", render::matches(&matches));
            }
            Command::Insight { target, allergies, offline, json } => {
                let allergies = normalize_allergies(&allergies)?;
                let mut session = open_session(&mut config)?;
                if offline {
                    session = session.with_insights(InsightService::rule_based());
                }
                load_weather(&mut session, &target).await?;

                // Explicit allergies replace the profile lookup.
                let insight = if allergies.is_empty() {
                    session.refresh_insight().await?
                } else {
                    session.refresh_insight_for(&allergies).await?
                };

                if json {
                    let out = serde_json::json!({ "source": insight.source, "result": insight.result });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                } else {
                    print!("{}", render::insight(&insight));
                }
            }
            Command::Activities { target, offline } => {
                let mut session = open_session(&mut config)?;
                if offline {
                    session = session.with_insights(InsightService::rule_based());
                }
                load_weather(&mut session, &target).await?;
                print!("{}", render::activities(&session.activities().await?));
            }
            Command::Locations { action } => locations(&mut config, action).await?,
            Command::Profile { action } => profile(&mut config, action).await?,
            Command::Review { action } => review(&mut config, action).await?,
            Command::Testimonial { action } => testimonial(&mut config, action).await?,
        }

        Ok(())
    }
}

fn configure(service: &str) -> Result<()> {
    let id = ServiceId::try_from(service)?;
    let mut config = Config::load()?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.upsert_api_key(id, api_key.trim().to_string());

    if id.requires_base_url() {
        let url = inquire::Text::new("Project URL:")
            .with_placeholder("https://<project>.supabase.co")
            .prompt()
            .context("Failed to read project URL")?;
        config.set_base_url(id, url.trim().to_string());
    }

    if id == ServiceId::Gemini {
        let model = inquire::Text::new("Model:")
            .with_default(weatherwise_core::insight::remote::DEFAULT_MODEL)
            .prompt()
            .context("Failed to read model name")?;
        config.set_model(id, model.trim().to_string());
    }

    config.ensure_user_id();
    config.save()?;
    println!("Saved {id} credentials to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Builds a session, with persistence when the database is configured.
fn open_session(config: &mut Config) -> Result<WeatherSession> {
    let provider = provider_from_config(config)?;
    let session = WeatherSession::new(provider, InsightService::from_config(config))
        .with_state(WeatherState::with_unit(config.temperature_unit));

    match backend_from_config(config) {
        Ok(client) => {
            let user_id = user_id(config)?;
            Ok(session.with_store(Box::new(client), user_id))
        }
        Err(err) => {
            tracing::debug!(error = %err, "running without persistence");
            Ok(session)
        }
    }
}

async fn load_weather(session: &mut WeatherSession, target: &Target) -> Result<()> {
    match (&target.address, target.lat, target.lon) {
        (_, Some(lat), Some(lon)) => {
            session.locate(lat, lon).await?;
        }
        (Some(address), _, _) => {
            session.search(address).await?;
        }
        _ => bail!("Provide an address, or both --lat and --lon."),
    }
    Ok(())
}

/// Stable anonymous id, generated and saved on first use. Only the file
/// config is written back so environment keys never land on disk.
fn user_id(config: &mut Config) -> Result<String> {
    if let Some(id) = &config.user_id {
        return Ok(id.clone());
    }
    let mut stored = Config::load()?;
    let id = stored.ensure_user_id().to_string();
    stored.save()?;
    config.user_id = Some(id.clone());
    Ok(id)
}

fn database(config: &mut Config) -> Result<(SupabaseClient, String)> {
    let client = backend_from_config(config)?;
    Ok((client, user_id(config)?))
}

async fn locations(config: &mut Config, action: LocationsAction) -> Result<()> {
    let (db, user_id) = database(config)?;

    match action {
        LocationsAction::List { favorites } => {
            let list = if favorites {
                db.favorite_locations(&user_id).await?
            } else {
                db.locations(&user_id).await?
            };
            print!("{}", render::saved_locations(&list));
        }
        LocationsAction::Add { address } => {
            let provider = provider_from_config(config)?;
            let data = provider.weather_by_location(&address).await?;
            let saved = db.create_location(&NewSavedLocation::from_snapshot(&user_id, &data)).await?;
            println!("Saved {} ({}) as {}", saved.name, saved.country, saved.id);
        }
        LocationsAction::Remove { id } => {
            db.delete_location(&id).await?;
            println!("Removed {id}");
        }
        LocationsAction::Favorite { id } => {
            let loc = db.toggle_favorite(&id).await?;
            let state = if loc.is_favorite { "now a favorite" } else { "no longer a favorite" };
            println!("{} is {state}", loc.name);
        }
    }
    Ok(())
}

async fn profile(config: &mut Config, action: ProfileAction) -> Result<()> {
    let (db, user_id) = database(config)?;

    match action {
        ProfileAction::Show => {
            let profile = db.get_or_create_profile(&user_id, None, None).await?;
            print!("{}", render::profile(&profile));
        }
        ProfileAction::Allergies { allergies } => {
            let allergies = normalize_allergies(&allergies)?;
            db.get_or_create_profile(&user_id, None, None).await?;
            let changes = ProfileUpdate { allergies: Some(allergies), ..Default::default() };
            let profile = db.update_user(&user_id, &changes).await?;
            print!("{}", render::profile(&profile));
        }
    }
    Ok(())
}

async fn review(config: &mut Config, action: ReviewAction) -> Result<()> {
    let (db, user_id) = database(config)?;

    match action {
        ReviewAction::Submit { rating, comment, name } => {
            let profile = db.get_or_create_profile(&user_id, None, None).await?;
            let submission = ReviewSubmission {
                user_name: name.unwrap_or_else(|| display_name(&profile)),
                user_email: profile.email.unwrap_or_default(),
                user_id,
                rating,
                comment,
            };
            let review = db.create_review(&submission).await?;
            println!("Thanks! Review {} saved.", review.id);
        }
        ReviewAction::List { mine } => {
            let list = if mine { db.user_reviews(&user_id).await? } else { db.reviews().await? };
            print!("{}", render::reviews(&list));
        }
    }
    Ok(())
}

async fn testimonial(config: &mut Config, action: TestimonialAction) -> Result<()> {
    let (db, user_id) = database(config)?;

    match action {
        TestimonialAction::Submit { rating, content, title, name, email } => {
            let profile = db.get_or_create_profile(&user_id, email.as_deref(), name.as_deref()).await?;
            let submission = TestimonialSubmission {
                user_name: name.unwrap_or_else(|| display_name(&profile)),
                user_email: email.or(profile.email).unwrap_or_default(),
                user_id,
                rating,
                title,
                content,
            };
            let created = db.create_testimonial(&submission).await?;
            println!("Thanks! Testimonial {} is awaiting approval.", created.id);
        }
        TestimonialAction::List { featured } => {
            let list = if featured {
                db.featured_testimonials().await?
            } else {
                db.approved_testimonials().await?
            };
            print!("{}", render::testimonials(&list));
        }
    }
    Ok(())
}

/// Canonical names of user-typed allergies; rejects unknown ones.
fn normalize_allergies(raw: &[String]) -> Result<Vec<String>> {
    raw.iter()
        .map(|a| Ok(Allergy::try_from(a.as_str())?.as_str().to_string()))
        .collect()
}

fn display_name(profile: &UserProfile) -> String {
    profile.name.clone().unwrap_or_else(|| "User".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinates_with_negative_longitude() {
        let cli = Cli::try_parse_from(["weatherwise", "show", "--lat", "38.7", "--lon", "-9.1"]).unwrap();

        match cli.command {
            Command::Show { target, .. } => {
                assert_eq!(target.lat, Some(38.7));
                assert_eq!(target.lon, Some(-9.1));
                assert!(target.address.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["weatherwise", "show", "--lat", "38.7"]).is_err());
    }

    #[test]
    fn repeated_allergies_and_unit() {
        let cli = Cli::try_parse_from([
            "weatherwise", "insight", "Lisbon", "--allergy", "pollen", "--allergy", "mold", "--offline",
        ])
        .unwrap();
        match cli.command {
            Command::Insight { allergies, offline, .. } => {
                assert_eq!(allergies, ["pollen", "mold"]);
                assert!(offline);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["weatherwise", "show", "Porto", "--unit", "f"]).unwrap();
        assert!(matches!(cli.command, Command::Show { unit: Some(TemperatureUnit::Fahrenheit), .. }));
        assert!(Cli::try_parse_from(["weatherwise", "show", "Porto", "--unit", "k"]).is_err());
    }

    #[test]
    fn allergies_are_normalized_before_use() {
        let raw = ["Pollen ".to_string(), "tree pollen".to_string(), "MOLD".to_string()];
        assert_eq!(normalize_allergies(&raw).unwrap(), ["pollen", "tree_pollen", "mold"]);

        let err = normalize_allergies(&["cats".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Unknown allergy 'cats'"));
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["weatherwise", "-vv", "search", "Lis"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
