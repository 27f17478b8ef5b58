use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_cookie_expire_days: i64,
    pub run_mode: String,
    pub suggestion_api_url: String,
    pub suggestion_api_token: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Booking management API")]
pub struct Args {
    /// Host to bind to (overrides BOOKING_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BOOKING_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides BOOKING_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("BOOKING_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("BOOKING_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing BOOKING_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 5000,
            Err(err) => return Err(err).context("reading BOOKING_PORT"),
        };
        let env_db = env::var("BOOKING_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/booking_api.db".into());
        let jwt_secret =
            env::var("BOOKING_JWT_SECRET").unwrap_or_else(|_| "dev-only-secret".into());
        let jwt_cookie_expire_days = match env::var("BOOKING_JWT_COOKIE_EXPIRE_DAYS") {
            Ok(value) => value.parse::<i64>().with_context(|| {
                format!("parsing BOOKING_JWT_COOKIE_EXPIRE_DAYS value `{}`", value)
            })?,
            Err(env::VarError::NotPresent) => 30,
            Err(err) => return Err(err).context("reading BOOKING_JWT_COOKIE_EXPIRE_DAYS"),
        };
        let run_mode = env::var("BOOKING_ENV").unwrap_or_else(|_| "development".into());
        let suggestion_api_url = env::var("BOOKING_SUGGESTION_API_URL")
            .unwrap_or_else(|_| "https://api-inference.huggingface.co/models/distilgpt2".into());
        let suggestion_api_token = env::var("BOOKING_SUGGESTION_API_TOKEN").ok();

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            jwt_secret,
            jwt_cookie_expire_days,
            run_mode,
            suggestion_api_url,
            suggestion_api_token,
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.run_mode == "production"
    }
}
