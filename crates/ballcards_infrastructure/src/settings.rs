use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;

// Values from the config file can be overridden with environment variables,
// i.g., BALLCARDS_SERVER__PORT=4000.
const ENV_PREFIX: &str = "BALLCARDS";

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Mongodb,
    // Players kept in the process memory, lost on restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub backend: Backend,
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cors {
    // The web app origin (i.g., http://localhost:5173). Any origin is allowed when not set.
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Seed {
    // The endpoint serving the raw baseball data set as a json array.
    pub source_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub environment: String,
    pub server: Server,
    pub logger: Logger,
    pub database: Database,
    #[serde(default)]
    pub cors: Cors,
    pub seed: Seed,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        };

        let builder = Config::builder()
            .add_source(File::with_name(&format!("config/{config}")))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder
            .build()?
            // Deserialize (and thus freeze) the entire configuration.
            .try_deserialize()
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "http://{}:{}", &self.host, &self.port)
    }
}
