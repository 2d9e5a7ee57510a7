//! Button — a physical push-button wired to a digital input line.
//!
//! Buttons are described by a compact spec string:
//!
//! ```text
//! name:pin[:active-high|active-low][:pull-none|pull-up|pull-down|pull-auto]
//! ```
//!
//! Several specs are joined with commas. Omitted tokens default to
//! `active-high` and `pull-auto`. `pull-auto` is resolved here, once, so the
//! idle level of the line is always defined: active-low buttons get a
//! pull-up, active-high buttons a pull-down.

pub mod debounce;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// BCM line number of a GPIO input, written `GPIO<n>` or `<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(u8);

impl PinId {
    #[must_use]
    pub fn new(line: u8) -> Self {
        Self(line)
    }

    /// The BCM line number.
    #[must_use]
    pub fn line(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// A pin token that is neither `GPIO<n>` nor `<n>`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid pin `{0}`")]
pub struct InvalidPin(pub String);

impl FromStr for PinId {
    type Err = InvalidPin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = match s.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("gpio") => &s[4..],
            _ => s,
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidPin(s.to_string()));
        }
        digits
            .parse()
            .map(Self)
            .map_err(|_| InvalidPin(s.to_string()))
    }
}

/// Which electrical level means "pressed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Translate an electrical level into the logical "pressed" level.
    #[must_use]
    pub fn is_active(self, level_high: bool) -> bool {
        match self {
            Self::ActiveHigh => level_high,
            Self::ActiveLow => !level_high,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActiveHigh => f.write_str("active-high"),
            Self::ActiveLow => f.write_str("active-low"),
        }
    }
}

/// Pull-resistor mode as written in a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PullMode {
    None,
    Up,
    Down,
    #[default]
    Auto,
}

impl PullMode {
    /// Pick the concrete bias for a button of the given polarity.
    #[must_use]
    pub fn resolve(self, polarity: Polarity) -> Pull {
        match (self, polarity) {
            (Self::None, _) => Pull::None,
            (Self::Up, _) | (Self::Auto, Polarity::ActiveLow) => Pull::Up,
            (Self::Down, _) | (Self::Auto, Polarity::ActiveHigh) => Pull::Down,
        }
    }
}

/// Resolved pull-resistor configuration applied to an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pull {
    None,
    Up,
    Down,
}

/// A single configured button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSpec {
    pub name: String,
    pub pin: PinId,
    pub polarity: Polarity,
    pub pull: Pull,
}

impl ButtonSpec {
    /// Build a spec from already-typed parts, resolving `pull_mode`.
    #[must_use]
    pub fn new(name: impl Into<String>, pin: PinId, polarity: Polarity, pull_mode: PullMode) -> Self {
        Self {
            name: name.into(),
            pin,
            polarity,
            pull: pull_mode.resolve(polarity),
        }
    }
}

impl FromStr for ButtonSpec {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ConfigError::InvalidButtonSpec {
            spec: raw.to_string(),
            reason,
        };

        let mut tokens = raw.trim().split(':');
        let name = tokens.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(invalid("missing button name".to_string()));
        }
        let pin_token = tokens
            .next()
            .map(str::trim)
            .ok_or_else(|| invalid("missing pin".to_string()))?;
        let pin = pin_token
            .parse::<PinId>()
            .map_err(|err| invalid(err.to_string()))?;

        let mut polarity = None;
        let mut pull = None;
        for token in tokens.map(str::trim) {
            match token {
                "active-high" | "active-low" if polarity.is_some() => {
                    return Err(invalid("polarity given twice".to_string()));
                }
                "active-high" => polarity = Some(Polarity::ActiveHigh),
                "active-low" => polarity = Some(Polarity::ActiveLow),
                "pull-none" | "pull-up" | "pull-down" | "pull-auto" if pull.is_some() => {
                    return Err(invalid("pull mode given twice".to_string()));
                }
                "pull-none" => pull = Some(PullMode::None),
                "pull-up" => pull = Some(PullMode::Up),
                "pull-down" => pull = Some(PullMode::Down),
                "pull-auto" => pull = Some(PullMode::Auto),
                other => return Err(invalid(format!("unknown token `{other}`"))),
            }
        }

        Ok(Self::new(
            name,
            pin,
            polarity.unwrap_or_default(),
            pull.unwrap_or_default(),
        ))
    }
}

/// Parse a comma-separated list of button specs.
///
/// Empty entries (including an empty list) are skipped.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidButtonSpec`] for the first unparsable entry
/// and [`ConfigError::DuplicateButton`] when a name or pin repeats.
pub fn parse_button_specs(list: &str) -> Result<Vec<ButtonSpec>, ConfigError> {
    let mut names = HashSet::new();
    let mut pins = HashSet::new();
    let mut specs = Vec::new();

    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let spec: ButtonSpec = entry.parse()?;
        if !names.insert(spec.name.clone()) {
            return Err(ConfigError::DuplicateButton {
                field: "name",
                value: spec.name,
            });
        }
        if !pins.insert(spec.pin) {
            return Err(ConfigError::DuplicateButton {
                field: "pin",
                value: spec.pin.to_string(),
            });
        }
        specs.push(spec);
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_full_spec() {
        let spec: ButtonSpec = "btn1:GPIO16:active-low:pull-up".parse().unwrap();
        assert_eq!(spec.name, "btn1");
        assert_eq!(spec.pin.to_string(), "GPIO16");
        assert_eq!(spec.polarity, Polarity::ActiveLow);
        assert_eq!(spec.pull, Pull::Up);
    }

    #[test]
    fn should_report_low_level_as_pressed_for_active_low() {
        let spec: ButtonSpec = "btn1:GPIO16:active-low:pull-up".parse().unwrap();
        assert!(spec.polarity.is_active(false));
        assert!(!spec.polarity.is_active(true));
    }

    #[test]
    fn should_default_to_active_high_with_pull_down() {
        let spec: ButtonSpec = "door:5".parse().unwrap();
        assert_eq!(spec.pin, PinId::new(5));
        assert_eq!(spec.polarity, Polarity::ActiveHigh);
        assert_eq!(spec.pull, Pull::Down);
    }

    #[test]
    fn should_resolve_auto_pull_from_polarity() {
        let low: ButtonSpec = "a:GPIO4:active-low:pull-auto".parse().unwrap();
        let high: ButtonSpec = "b:GPIO5:active-high:pull-auto".parse().unwrap();
        assert_eq!(low.pull, Pull::Up);
        assert_eq!(high.pull, Pull::Down);
    }

    #[test]
    fn should_keep_explicit_pull_none() {
        let spec: ButtonSpec = "a:GPIO4:active-low:pull-none".parse().unwrap();
        assert_eq!(spec.pull, Pull::None);
    }

    #[test]
    fn should_accept_lowercase_pin_prefix() {
        let spec: ButtonSpec = "a:gpio21".parse().unwrap();
        assert_eq!(spec.pin.line(), 21);
    }

    #[test]
    fn should_reject_missing_pin() {
        let err = "btn1".parse::<ButtonSpec>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidButtonSpec { .. }));
    }

    #[test]
    fn should_reject_unparsable_pin() {
        for raw in ["b:GPIOx", "b:GPIO", "b:+4", "b:GPIO+4", "b:300"] {
            assert!(raw.parse::<ButtonSpec>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn should_reject_unknown_token() {
        let err = "b:GPIO4:sideways".parse::<ButtonSpec>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidButtonSpec {
                spec: "b:GPIO4:sideways".to_string(),
                reason: "unknown token `sideways`".to_string(),
            }
        );
    }

    #[test]
    fn should_reject_repeated_polarity() {
        assert!("b:4:active-low:active-high".parse::<ButtonSpec>().is_err());
    }

    #[test]
    fn should_parse_comma_separated_list() {
        let specs = parse_button_specs("a:GPIO4, b:GPIO5:active-low ,").unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "a");
        assert_eq!(specs[1].polarity, Polarity::ActiveLow);
    }

    #[test]
    fn should_accept_empty_list() {
        assert!(parse_button_specs("").unwrap().is_empty());
    }

    #[test]
    fn should_reject_duplicate_name() {
        let err = parse_button_specs("a:GPIO4,a:GPIO5").unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateButton {
                field: "name",
                value: "a".to_string(),
            }
        );
    }

    #[test]
    fn should_reject_duplicate_pin_across_spellings() {
        let err = parse_button_specs("a:GPIO4,b:4").unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateButton {
                field: "pin",
                value: "GPIO4".to_string(),
            }
        );
    }
}
