use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Serial,
    Spi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub transport: Transport,
    pub consumer: ConsumerConfig,
    pub acquisition: AcquisitionSection,
    pub serial: SerialSection,
    pub spi: SpiSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Dashboard poll cadence; 100 ms gives the observed 10 Hz refresh.
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionSection {
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialSection {
    pub path: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpiSection {
    pub path: String,
    pub clock_hz: u32,
    pub bits_per_word: u8,
    pub poll_interval_ms: u64,
    pub log_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the TOML file, with `DASHBOARD_`-prefixed
    /// environment variables taking precedence.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("dashboard-feed/config"))
            .add_source(Self::env_source())
            .build()?;

        settings.try_deserialize()
    }

    /// Env overrides use `__` between key segments so snake_case field names
    /// stay addressable: `DASHBOARD_SERIAL__BAUD_RATE` maps to
    /// `serial.baud_rate`, `DASHBOARD_TRANSPORT` to `transport`.
    fn env_source() -> config::Environment {
        config::Environment::with_prefix("DASHBOARD")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    pub fn serial_config(&self) -> link::SerialConfig {
        link::SerialConfig {
            path: self.serial.path.clone(),
            baud_rate: self.serial.baud_rate,
            read_timeout: Duration::from_millis(self.serial.read_timeout_ms),
        }
    }

    pub fn spi_config(&self) -> link::SpiConfig {
        link::SpiConfig {
            path: self.spi.path.clone(),
            clock_hz: self.spi.clock_hz,
            bits_per_word: self.spi.bits_per_word,
            poll_interval: Duration::from_millis(self.spi.poll_interval_ms),
            log_path: self.spi.log_path.clone(),
        }
    }

    pub fn acquisition_config(&self) -> acquisition::AcquisitionConfig {
        acquisition::AcquisitionConfig {
            max_retries: self.acquisition.max_retries,
        }
    }
}

impl ConsumerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
