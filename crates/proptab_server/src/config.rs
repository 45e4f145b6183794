use std::{env, fmt, fs, io};

use log::info;
use proptab::Limits;
use serde::Deserialize;

const PATH: &str = "proptab-config.json";
const DEFAULT_BIND: &str = "127.0.0.1:7000";
const DEFAULT_MAX_STEPS: usize = 100_000;

#[derive(Debug)]
pub enum ConfigErr {
    Io(String, io::Error),
    Json(String, serde_json::Error),
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErr::Io(path, e) => write!(f, "Could not read config file {path}: {e}"),
            ConfigErr::Json(path, e) => write!(f, "Malformed config file {path}: {e}"),
        }
    }
}

impl std::error::Error for ConfigErr {}

impl From<ConfigErr> for io::Error {
    fn from(e: ConfigErr) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(rename = "maxSteps")]
    pub max_steps: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_steps: Some(DEFAULT_MAX_STEPS),
        }
    }
}

impl ServerConfig {
    /// Reads the file named by `PROPTAB_CONFIG` (falling back to defaults if
    /// it does not exist); `PROPTAB_BIND` overrides the bind address.
    pub fn load() -> Result<Self, ConfigErr> {
        let path = env::var("PROPTAB_CONFIG").unwrap_or_else(|_| PATH.to_string());
        let mut config = Self::from_file(&path)?;
        if let Ok(bind) = env::var("PROPTAB_BIND") {
            config.bind = bind;
        }
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigErr> {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).map_err(|e| ConfigErr::Json(path.to_string(), e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No config file at {path}, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigErr::Io(path.to_string(), e)),
        }
    }

    /// The server's step cap, tightened by a per-request cap if one is given.
    pub fn limits(&self, requested: Option<Limits>) -> Limits {
        let requested = requested.and_then(|l| l.max_steps);
        let max_steps = match (self.max_steps, requested) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Limits { max_steps }
    }
}
