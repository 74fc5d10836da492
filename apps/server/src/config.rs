//! Server configuration
//!
//! Sources are layered, later ones overriding earlier ones:
//! 1. Built-in defaults (every section is `#[serde(default)]`)
//! 2. A TOML file (`config/default.toml`, or the path given with `--config`)
//! 3. Environment variables: `DEVCAMPER__SECTION__KEY`, e.g. `DEVCAMPER__SERVER__PORT=8080`

use config::{Config as ConfigSource, ConfigError, Environment, File, FileFormat};
use devcamper_query::{CompilerConfig, DistanceUnit, EarthRadius};
use serde::{Deserialize, Serialize};
use std::net::{AddrParseError, SocketAddr};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "DEVCAMPER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub query: CompilerConfig,
    pub geo: GeoConfig,
    pub geocoder: GeocoderConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty disables CORS headers
    pub cors_origins: Vec<String>,
    pub max_request_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: Vec::new(),
            max_request_body_size: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub pool_min_size: u32,
    pub pool_max_size: u32,
    pub pool_timeout_seconds: u64,
    pub statement_timeout_seconds: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: String::new(),
            pool_min_size: 1,
            pool_max_size: 10,
            pool_timeout_seconds: 30,
            statement_timeout_seconds: 30,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub earth_radius: EarthRadius,
    /// Unit of the radius route's distance when `?unit=` is absent
    pub default_unit: DistanceUnit,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            earth_radius: EarthRadius::default(),
            default_unit: DistanceUnit::Miles,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocoderProvider {
    Mapquest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub provider: GeocoderProvider,
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            provider: GeocoderProvider::Mapquest,
            api_key: String::new(),
            base_url: "https://www.mapquestapi.com".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// daily, hourly, minutely or never
    pub file_rotation: String,
    pub deployment_environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_enabled: false,
            file_directory: "logs".to_string(),
            file_prefix: "devcamper".to_string(),
            file_rotation: "daily".to_string(),
            deployment_environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load from `config/default.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load from an explicit file (required when given) and the environment.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::build(path, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("server.cors_origins")
    }

    fn build(path: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        ConfigSource::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.query.default_limit == 0 || self.query.max_limit == 0 {
            return Err("query limits must be positive".to_string());
        }
        if self.query.default_limit > self.query.max_limit {
            return Err(format!(
                "query.default_limit ({}) exceeds query.max_limit ({})",
                self.query.default_limit, self.query.max_limit
            ));
        }
        if self.query.tiebreak_field.is_empty() {
            return Err("query.tiebreak_field must not be empty".to_string());
        }

        let radius = &self.geo.earth_radius;
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(radius.miles) || !positive(radius.kilometers) {
            return Err("geo.earth_radius values must be positive".to_string());
        }

        if self.database.backend == StoreBackend::Postgres {
            if self.database.url.trim().is_empty() {
                return Err("database.url is required for the postgres backend".to_string());
            }
            if self.database.pool_max_size == 0
                || self.database.pool_min_size > self.database.pool_max_size
            {
                return Err("database pool sizes are inconsistent".to_string());
            }
        }

        if self.server.max_request_body_size == 0 {
            return Err("server.max_request_body_size must be positive".to_string());
        }

        Ok(())
    }
}
