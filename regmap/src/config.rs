use crate::error::EncodeError;
use serde_derive::Deserialize;
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::io;
use std::path::Path;

const CONFIG_FILENAME: &str = "regmap.toml";
const DEFAULT_TARGET: &str = "sim0";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Connection target handed to the connector, e.g. a serial port path.
    pub target: Option<String>,
    pub simulator: Option<SimulatorConfig>,
}

impl Config {
    pub fn from_file() -> Result<Config, ConfigError> {
        Config::read(CONFIG_FILENAME)
    }

    pub fn read(filename: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let filename = filename.as_ref();
        let config_file = read_to_string(filename).map_err(|source| ConfigError::Read {
            filename: filename.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&config_file)?)
    }

    pub fn target(&self) -> &str {
        self.target.as_deref().unwrap_or(DEFAULT_TARGET)
    }
}

/// Settings for a [`SimulatedDevice`](crate::simulator::SimulatedDevice).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Value reported by the identity register, if it should differ from the family's.
    pub identity: Option<i32>,
    /// Simulated time that passes between consecutive replies.
    pub clock_step_us: u64,
    /// Whether replies carry a hardware timestamp.
    pub timestamps: bool,
    /// Register values by name, applied on top of the power-on values.
    pub registers: BTreeMap<String, i32>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            identity: None,
            clock_step_us: 1000,
            timestamps: true,
            registers: BTreeMap::new(),
        }
    }
}

#[derive(displaydoc::Display, Debug)]
pub enum ConfigError {
    /// failed to read `{filename}`: {source}
    Read { filename: String, source: io::Error },
    /// failed to parse config: {0}
    Parse(toml::de::Error),
    /// unknown register `{0}`
    UnknownRegister(String),
    /// invalid value for register `{name}`: {error}
    InvalidValue { name: String, error: EncodeError },
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(error) => Some(error),
            Self::UnknownRegister(_) => None,
            Self::InvalidValue { error, .. } => Some(error),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        Self::Parse(error)
    }
}
