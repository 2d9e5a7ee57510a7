//! Closed sets of hardware backends, selected once from configuration.

use switchhub_adapter_rpi::{GpioButtons, GpioCollection, PiFaceCollection};
use switchhub_adapter_virtual::{DummyCollection, SimulatedButtons};
use switchhub_app::ports::{ButtonInput, SwitchCollection};
use switchhub_domain::button::{ButtonSpec, PinId};
use switchhub_domain::collection::CollectionKind;
use switchhub_domain::error::SwitchHubError;

use crate::config::{ButtonInputKind, CollectionConfig};

macro_rules! each_backend {
    ($collection:expr, $inner:ident => $call:expr) => {
        match $collection {
            Collection::Dummy($inner) => $call,
            Collection::Gpio($inner) => $call,
            Collection::PiFace($inner) => $call,
        }
    };
}

/// Any configured switch collection.
pub enum Collection {
    Dummy(DummyCollection),
    Gpio(GpioCollection),
    PiFace(PiFaceCollection),
}

impl Collection {
    #[must_use]
    pub fn from_config(name: &str, config: &CollectionConfig) -> Self {
        match config {
            CollectionConfig::Dummy { switches } => Self::Dummy(DummyCollection::new(name, *switches)),
            CollectionConfig::Gpio(gpio) => Self::Gpio(GpioCollection::new(name, gpio.clone())),
            CollectionConfig::PiFace(piface) => {
                Self::PiFace(PiFaceCollection::new(name, piface.clone()))
            }
        }
    }
}

impl SwitchCollection for Collection {
    fn name(&self) -> &str {
        each_backend!(self, c => c.name())
    }

    fn kind(&self) -> CollectionKind {
        each_backend!(self, c => c.kind())
    }

    fn init(&self) -> Result<(), SwitchHubError> {
        each_backend!(self, c => c.init())
    }

    fn len(&self) -> usize {
        each_backend!(self, c => c.len())
    }

    fn get_state(&self, index: usize) -> Result<bool, SwitchHubError> {
        each_backend!(self, c => c.get_state(index))
    }

    fn set_state(&self, index: usize, on: bool) -> Result<(), SwitchHubError> {
        each_backend!(self, c => c.set_state(index, on))
    }

    fn detailed_state(&self) -> Result<Vec<bool>, SwitchHubError> {
        each_backend!(self, c => c.detailed_state())
    }

    fn close(&self) -> Result<(), SwitchHubError> {
        each_backend!(self, c => c.close())
    }
}

/// Any configured button input.
pub enum ButtonLines {
    Gpio(GpioButtons),
    Simulated(SimulatedButtons),
}

impl ButtonLines {
    #[must_use]
    pub fn from_kind(kind: ButtonInputKind) -> Self {
        match kind {
            ButtonInputKind::Gpio => Self::Gpio(GpioButtons::new()),
            ButtonInputKind::Simulated => Self::Simulated(SimulatedButtons::new()),
        }
    }
}

impl ButtonInput for ButtonLines {
    fn claim(&mut self, buttons: &[ButtonSpec]) -> Result<(), SwitchHubError> {
        match self {
            Self::Gpio(lines) => lines.claim(buttons),
            Self::Simulated(lines) => lines.claim(buttons),
        }
    }

    fn read_level(&mut self, pin: PinId) -> Result<bool, SwitchHubError> {
        match self {
            Self::Gpio(lines) => lines.read_level(pin),
            Self::Simulated(lines) => lines.read_level(pin),
        }
    }

    fn release(&mut self) {
        match self {
            Self::Gpio(lines) => lines.release(),
            Self::Simulated(lines) => lines.release(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchhub_adapter_rpi::{GpioConfig, PiFaceConfig};

    #[test]
    fn should_build_collection_matching_driver() {
        let dummy = Collection::from_config("sim", &CollectionConfig::Dummy { switches: 3 });
        assert_eq!(dummy.kind(), CollectionKind::Dummy);
        assert_eq!(dummy.len(), 3);
        assert_eq!(dummy.name(), "sim");

        let gpio = Collection::from_config(
            "relay",
            &CollectionConfig::Gpio(GpioConfig {
                pins: vec![17, 27],
                active_low: false,
            }),
        );
        assert_eq!(gpio.kind(), CollectionKind::Gpio);
        assert_eq!(gpio.len(), 2);

        let piface = Collection::from_config("pf", &CollectionConfig::PiFace(PiFaceConfig::default()));
        assert_eq!(piface.kind(), CollectionKind::PiFace);
        assert_eq!(piface.len(), 8);
    }

    #[test]
    fn should_delegate_state_to_dummy_backend() {
        let dummy = Collection::from_config("sim", &CollectionConfig::Dummy { switches: 2 });
        dummy.init().unwrap();
        dummy.set_state(1, true).unwrap();
        assert_eq!(dummy.detailed_state().unwrap(), vec![false, true]);
    }

    #[test]
    fn should_read_simulated_lines_through_enum() {
        let mut lines = ButtonLines::from_kind(ButtonInputKind::Simulated);
        let spec: ButtonSpec = "btn1:GPIO16:active-low:pull-up".parse().unwrap();
        lines.claim(&[spec]).unwrap();
        assert!(lines.read_level(PinId::new(16)).unwrap());
        lines.release();
        assert!(lines.read_level(PinId::new(16)).is_err());
    }
}
