//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `switchhub.toml` in the working directory, or at the path in
//! `SWITCHHUB_CONFIG`. Every field has a sensible default so the file is
//! optional; without any collection configured, a four-switch dummy
//! collection is used so the daemon starts on any host. Environment
//! variables take precedence over file values.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use switchhub_adapter_rpi::{GpioConfig, PiFaceConfig};
use switchhub_app::button_driver::ButtonDriverConfig;
use switchhub_app::group::BulkPolicy;
use switchhub_domain::button::{ButtonSpec, parse_button_specs};

const DEFAULT_PATH: &str = "switchhub.toml";
const DEMO_COLLECTION: &str = "dummy";
const DEMO_SWITCHES: usize = 4;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Switch collections by name.
    pub collections: BTreeMap<String, CollectionConfig>,
    /// Logical switches: name to `"<collection>.<index>"`.
    pub switches: BTreeMap<String, String>,
    /// Groups: name to ordered member switch names.
    pub groups: BTreeMap<String, Vec<String>>,
    /// What a group does when a member fails mid-operation.
    pub group_policy: BulkPolicy,
    /// Button monitoring.
    pub buttons: ButtonsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// One switch collection, selected by its `driver` key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum CollectionConfig {
    Dummy {
        #[serde(default = "default_dummy_switches")]
        switches: usize,
    },
    Gpio(GpioConfig),
    PiFace(PiFaceConfig),
}

fn default_dummy_switches() -> usize {
    DEMO_SWITCHES
}

/// Where button levels are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonInputKind {
    #[default]
    Gpio,
    Simulated,
}

/// Button driver configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ButtonsConfig {
    pub enabled: bool,
    pub input: ButtonInputKind,
    /// `name:pin[:polarity][:pull]` entries, comma-separated.
    pub specs: String,
    pub debounce_ms: u64,
    pub poll_ms: u64,
    /// Events buffered per subscriber before the oldest are dropped.
    pub channel_capacity: usize,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("SWITCHHUB_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::demo()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Parse TOML content, falling back to the demo collection when none is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        if config.collections.is_empty() && config.switches.is_empty() {
            config.add_demo_switches();
        }
        Ok(config)
    }

    /// Defaults plus a four-switch dummy collection.
    #[must_use]
    pub fn demo() -> Self {
        let mut config = Self::default();
        config.add_demo_switches();
        config
    }

    fn add_demo_switches(&mut self) {
        self.collections.insert(
            DEMO_COLLECTION.to_string(),
            CollectionConfig::Dummy {
                switches: DEMO_SWITCHES,
            },
        );
        for index in 0..DEMO_SWITCHES {
            self.switches
                .insert(format!("switch{index}"), format!("{DEMO_COLLECTION}.{index}"));
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SWITCHHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("SWITCHHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("SWITCHHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("SWITCHHUB_BUTTONS") {
            self.buttons.enabled = true;
            self.buttons.specs = val;
        }
        if let Ok(val) = std::env::var("SWITCHHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    /// Check values that parse but cannot work.
    ///
    /// Switch specs and group members are checked when the switchboard is
    /// built.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        for (name, collection) in &self.collections {
            if let CollectionConfig::PiFace(piface) = collection {
                piface.validate().map_err(|err| {
                    ConfigError::Validation(format!("collection `{name}`: {err}"))
                })?;
            }
        }
        // The event bus is sized from the button settings even when buttons are off.
        self.buttons.driver_config().validate()?;
        if self.buttons.enabled {
            self.button_specs()?;
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Parsed button specs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Domain`] for an invalid or duplicate spec.
    pub fn button_specs(&self) -> Result<Vec<ButtonSpec>, ConfigError> {
        Ok(parse_button_specs(&self.buttons.specs)?)
    }

    /// Group member lists as borrowed slices.
    pub fn group_members(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(name, members)| (name.as_str(), members.as_slice()))
    }

    /// Switch specs as borrowed pairs.
    pub fn switch_specs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.switches
            .iter()
            .map(|(name, spec)| (name.as_str(), spec.as_str()))
    }
}

impl ButtonsConfig {
    #[must_use]
    pub fn driver_config(&self) -> ButtonDriverConfig {
        ButtonDriverConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            poll_interval: Duration::from_millis(self.poll_ms),
            channel_capacity: self.channel_capacity,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "switchd=info,switchhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for ButtonsConfig {
    fn default() -> Self {
        let driver = ButtonDriverConfig::default();
        Self {
            enabled: false,
            input: ButtonInputKind::default(),
            specs: String::new(),
            debounce_ms: u64::try_from(driver.debounce.as_millis()).unwrap_or(50),
            poll_ms: u64::try_from(driver.poll_interval.as_millis()).unwrap_or(5),
            channel_capacity: driver.channel_capacity,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// Invalid button spec list.
    #[error("invalid configuration")]
    Domain(#[from] switchhub_domain::error::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchhub_domain::button::Polarity;
    use switchhub_domain::error::ConfigError as DomainConfigError;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.group_policy, BulkPolicy::ContinueOnError);
        assert!(!config.buttons.enabled);
        assert_eq!(config.buttons.debounce_ms, 50);
        assert_eq!(config.buttons.poll_ms, 5);
    }

    #[test]
    fn should_fall_back_to_demo_collection_for_empty_file() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(
            config.collections["dummy"],
            CollectionConfig::Dummy { switches: 4 }
        );
        assert_eq!(config.switches.len(), 4);
        assert_eq!(config.switches["switch3"], "dummy.3");
    }

    #[test]
    fn should_return_demo_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.switches.len(), 4);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            group_policy = 'abort-on-error'

            [server]
            host = '127.0.0.1'
            port = 9090

            [logging]
            filter = 'debug'

            [collections.relay]
            driver = 'gpio'
            pins = [17, 27, 22, 23]
            active_low = true

            [collections.pf]
            driver = 'piface'
            device = '/dev/spidev0.1'
            hardware_address = 1

            [collections.sim]
            driver = 'dummy'
            switches = 2

            [switches]
            lamp = 'relay.0'
            fan = 'pf.7'

            [groups]
            all = ['lamp', 'fan']

            [buttons]
            enabled = true
            input = 'simulated'
            specs = 'btn1:GPIO16:active-low:pull-up'
            debounce_ms = 30
        ";
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.group_policy, BulkPolicy::AbortOnError);
        assert_eq!(
            config.collections["relay"],
            CollectionConfig::Gpio(GpioConfig {
                pins: vec![17, 27, 22, 23],
                active_low: true,
            })
        );
        let CollectionConfig::PiFace(piface) = &config.collections["pf"] else {
            panic!("expected piface collection");
        };
        assert_eq!(piface.device, "/dev/spidev0.1");
        assert_eq!(piface.hardware_address, 1);
        assert_eq!(piface.channels.len(), 8);
        assert_eq!(
            config.collections["sim"],
            CollectionConfig::Dummy { switches: 2 }
        );
        assert_eq!(config.groups["all"], vec!["lamp", "fan"]);
        assert_eq!(config.buttons.input, ButtonInputKind::Simulated);
        assert_eq!(
            config.buttons.driver_config().debounce,
            Duration::from_millis(30)
        );

        let buttons = config.button_specs().unwrap();
        assert_eq!(buttons[0].polarity, Polarity::ActiveLow);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_not_add_demo_switches_when_collections_configured() {
        let config = Config::from_toml("[collections.relay]\ndriver = 'dummy'").unwrap();
        assert_eq!(config.collections.len(), 1);
        assert!(config.switches.is_empty());
    }

    #[test]
    fn should_reject_unknown_driver() {
        assert!(Config::from_toml("[collections.x]\ndriver = 'serial'").is_err());
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_piface_address_out_of_range() {
        let config = Config::from_toml(
            "[collections.pf]\ndriver = 'piface'\nhardware_address = 4",
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: collection `pf`: hardware address 4 out of range 0-3"
        );
    }

    #[test]
    fn should_reject_invalid_button_specs_when_enabled() {
        let mut config = Config::default();
        config.buttons.enabled = true;
        config.buttons.specs = "a:GPIO4,b:GPIO4".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Domain(_))
        ));

        config.buttons.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_poll_interval() {
        let mut config = Config::default();
        config.buttons.enabled = true;
        config.buttons.poll_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_channel_capacity_with_buttons_disabled() {
        let config = Config::from_toml("[buttons]\nchannel_capacity = 0").unwrap();
        assert!(!config.buttons.enabled);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Domain(DomainConfigError::ZeroSetting {
                field: "channel_capacity"
            }))
        ));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        assert!(matches!(
            Config::from_toml("invalid {{{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
