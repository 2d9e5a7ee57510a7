//! Test doubles shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use switchhub_domain::button::{ButtonSpec, PinId};
use switchhub_domain::collection::CollectionKind;
use switchhub_domain::error::{DriverError, IndexOutOfRange, SwitchHubError};

use crate::ports::{ButtonInput, SwitchCollection};

/// In-memory collection with optional injected failures.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    levels: Mutex<Vec<bool>>,
    failing: Mutex<HashSet<usize>>,
    fail_init: bool,
    pub init_calls: Mutex<usize>,
    pub close_calls: Mutex<usize>,
}

impl MemoryCollection {
    pub fn new(name: &str, len: usize) -> Self {
        Self {
            name: name.to_string(),
            levels: Mutex::new(vec![false; len]),
            failing: Mutex::new(HashSet::new()),
            fail_init: false,
            init_calls: Mutex::new(0),
            close_calls: Mutex::new(0),
        }
    }

    pub fn failing_init(name: &str, len: usize) -> Self {
        Self {
            fail_init: true,
            ..Self::new(name, len)
        }
    }

    pub fn fail_writes_to(&self, index: usize) {
        self.failing.lock().unwrap().insert(index);
    }

    pub fn levels(&self) -> Vec<bool> {
        self.levels.lock().unwrap().clone()
    }

    fn check(&self, index: usize) -> Result<(), SwitchHubError> {
        let len = self.len();
        if index >= len {
            return Err(IndexOutOfRange { index, len }.into());
        }
        Ok(())
    }
}

impl SwitchCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> CollectionKind {
        CollectionKind::Dummy
    }

    fn init(&self) -> Result<(), SwitchHubError> {
        *self.init_calls.lock().unwrap() += 1;
        if self.fail_init {
            return Err(DriverError::init(self.name.as_str(), "device missing").into());
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.levels.lock().unwrap().len()
    }

    fn get_state(&self, index: usize) -> Result<bool, SwitchHubError> {
        self.check(index)?;
        Ok(self.levels.lock().unwrap()[index])
    }

    fn set_state(&self, index: usize, on: bool) -> Result<(), SwitchHubError> {
        self.check(index)?;
        if self.failing.lock().unwrap().contains(&index) {
            return Err(DriverError::io(self.name.as_str(), "write refused").into());
        }
        self.levels.lock().unwrap()[index] = on;
        Ok(())
    }

    fn close(&self) -> Result<(), SwitchHubError> {
        *self.close_calls.lock().unwrap() += 1;
        Ok(())
    }
}

/// Input lines whose levels the test drives through a shared map.
#[derive(Clone, Default)]
pub struct ScriptedInput {
    pub levels: Arc<Mutex<HashMap<PinId, bool>>>,
    pub claimed: Arc<Mutex<Vec<PinId>>>,
    pub refuse_claim: bool,
}

impl ScriptedInput {
    pub fn set(&self, pin: u8, high: bool) {
        self.levels.lock().unwrap().insert(PinId::new(pin), high);
    }
}

impl ButtonInput for ScriptedInput {
    fn claim(&mut self, buttons: &[ButtonSpec]) -> Result<(), SwitchHubError> {
        if self.refuse_claim {
            return Err(DriverError::init("gpio", "line busy").into());
        }
        let mut claimed = self.claimed.lock().unwrap();
        claimed.extend(buttons.iter().map(|b| b.pin));
        Ok(())
    }

    fn read_level(&mut self, pin: PinId) -> Result<bool, SwitchHubError> {
        Ok(self
            .levels
            .lock()
            .unwrap()
            .get(&pin)
            .copied()
            .unwrap_or(false))
    }

    fn release(&mut self) {
        self.claimed.lock().unwrap().clear();
    }
}
