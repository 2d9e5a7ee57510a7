//! Collection — a named set of same-driver outputs.

use serde::{Deserialize, Serialize};

/// Backend driving a collection of switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// In-memory outputs with no real I/O.
    Dummy,
    /// Raspberry Pi GPIO output lines.
    Gpio,
    /// PiFace Digital expansion board (MCP23S17 over SPI).
    PiFace,
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => f.write_str("dummy"),
            Self::Gpio => f.write_str("gpio"),
            Self::PiFace => f.write_str("piface"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_lowercase_driver_names() {
        assert_eq!(CollectionKind::Dummy.to_string(), "dummy");
        assert_eq!(CollectionKind::Gpio.to_string(), "gpio");
        assert_eq!(CollectionKind::PiFace.to_string(), "piface");
    }

    #[test]
    fn should_deserialize_from_driver_name() {
        let kind: CollectionKind = serde_json::from_str("\"piface\"").unwrap();
        assert_eq!(kind, CollectionKind::PiFace);
    }
}
