//! Button driver — polls input lines, debounces them and emits press and
//! release events.
//!
//! Lifecycle: buttons are added while stopped; [`ButtonDriver::start`] claims
//! the lines and spawns one monitoring task that owns the input and every
//! debouncer; [`ButtonDriver::stop`] signals the task, gets the input back and
//! releases the lines. Each start begins with fresh debounce state and a
//! fresh event stream.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use switchhub_domain::button::debounce::Debouncer;
use switchhub_domain::button::{ButtonSpec, parse_button_specs};
use switchhub_domain::error::{ConfigError, DriverError, SwitchHubError, UsageError};
use switchhub_domain::event::ButtonEvent;

use crate::ports::ButtonInput;

/// Timing and buffering of the monitoring task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonDriverConfig {
    /// How long a level must stay stable before it is committed.
    pub debounce: Duration,
    /// Sampling period of the input lines.
    pub poll_interval: Duration,
    /// Events buffered per subscriber before the oldest are dropped.
    pub channel_capacity: usize,
}

impl Default for ButtonDriverConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
            channel_capacity: 64,
        }
    }
}

impl ButtonDriverConfig {
    /// Reject settings the monitoring task cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroSetting`] for a zero poll interval or
    /// channel capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroSetting {
                field: "poll_interval",
            });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroSetting {
                field: "channel_capacity",
            });
        }
        Ok(())
    }
}

struct Running<I> {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<I>,
    events: broadcast::Sender<ButtonEvent>,
}

/// Debounced button monitor over a [`ButtonInput`].
pub struct ButtonDriver<I> {
    config: ButtonDriverConfig,
    buttons: Vec<ButtonSpec>,
    input: Option<I>,
    running: Option<Running<I>>,
}

impl<I: ButtonInput> ButtonDriver<I> {
    #[must_use]
    pub fn new(input: I, config: ButtonDriverConfig) -> Self {
        Self {
            config,
            buttons: Vec::new(),
            input: Some(input),
            running: None,
        }
    }

    #[must_use]
    pub fn buttons(&self) -> &[ButtonSpec] {
        &self.buttons
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Register one button.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::DriverNotReady`] while running and
    /// [`ConfigError::DuplicateButton`] when the name or pin is taken.
    pub fn add_button(&mut self, spec: ButtonSpec) -> Result<(), SwitchHubError> {
        if self.running.is_some() {
            return Err(UsageError::DriverNotReady.into());
        }
        self.check_unique(&spec)?;
        tracing::debug!(button = %spec.name, pin = %spec.pin, polarity = %spec.polarity, "button added");
        self.buttons.push(spec);
        Ok(())
    }

    /// Parse a comma-separated spec list and register every button in it.
    ///
    /// Nothing is added unless the whole list is valid.
    ///
    /// # Errors
    ///
    /// Returns the first parse or duplicate error, or
    /// [`UsageError::DriverNotReady`] while running.
    pub fn add_buttons_from_spec(&mut self, list: &str) -> Result<usize, SwitchHubError> {
        if self.running.is_some() {
            return Err(UsageError::DriverNotReady.into());
        }
        let specs = parse_button_specs(list)?;
        for spec in &specs {
            self.check_unique(spec)?;
        }
        let count = specs.len();
        for spec in specs {
            self.add_button(spec)?;
        }
        Ok(count)
    }

    fn check_unique(&self, spec: &ButtonSpec) -> Result<(), ConfigError> {
        if self.buttons.iter().any(|b| b.name == spec.name) {
            return Err(ConfigError::DuplicateButton {
                field: "name",
                value: spec.name.clone(),
            });
        }
        if self.buttons.iter().any(|b| b.pin == spec.pin) {
            return Err(ConfigError::DuplicateButton {
                field: "pin",
                value: spec.pin.to_string(),
            });
        }
        Ok(())
    }

    /// Claim the input lines and spawn the monitoring task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::DriverNotReady`] if already running,
    /// [`ConfigError::ZeroSetting`] for an unusable configuration, or the
    /// driver error raised while claiming lines. The driver stays stopped
    /// and can be started again after a claim failure.
    pub fn start(&mut self) -> Result<(), SwitchHubError> {
        if self.running.is_some() {
            return Err(UsageError::DriverNotReady.into());
        }
        self.config.validate()?;
        let mut input = self.input.take().ok_or_else(|| DriverError::NotInitialized {
            device: "button input".to_string(),
        })?;
        if let Err(err) = input.claim(&self.buttons) {
            self.input = Some(input);
            return Err(err);
        }

        let (events, _) = broadcast::channel(self.config.channel_capacity);
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(monitor(
            input,
            self.buttons.clone(),
            self.config,
            events.clone(),
            shutdown_rx,
        ));
        self.running = Some(Running {
            shutdown,
            task,
            events,
        });

        tracing::info!(
            buttons = self.buttons.len(),
            debounce_ms = self.config.debounce.as_millis(),
            "button driver started"
        );
        Ok(())
    }

    /// Stop the monitoring task and release the lines. No-op when stopped.
    ///
    /// # Errors
    ///
    /// Returns a driver error if the monitoring task panicked; the input is
    /// lost in that case and the driver cannot be started again.
    pub async fn stop(&mut self) -> Result<(), SwitchHubError> {
        let Some(Running {
            shutdown,
            task,
            events,
        }) = self.running.take()
        else {
            return Ok(());
        };

        let _ = shutdown.send(());
        let joined = task.await;
        drop(events);

        match joined {
            Ok(mut input) => {
                input.release();
                self.input = Some(input);
                tracing::info!("button driver stopped");
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "button monitor task failed");
                Err(DriverError::io("button driver", err).into())
            }
        }
    }

    /// Subscribe to the events of the current run.
    ///
    /// Only events emitted after the call are received. The stream ends
    /// when the driver stops.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::NotRunning`] when the driver is stopped.
    pub fn events(&self) -> Result<ButtonEvents, SwitchHubError> {
        let running = self.running.as_ref().ok_or(UsageError::NotRunning)?;
        Ok(ButtonEvents {
            rx: running.events.subscribe(),
        })
    }
}

/// Subscription to a running driver's events.
pub struct ButtonEvents {
    rx: broadcast::Receiver<ButtonEvent>,
}

impl ButtonEvents {
    /// Next event, or `None` once the driver has stopped.
    ///
    /// A subscriber that falls behind skips the oldest events.
    pub async fn next(&mut self) -> Option<ButtonEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "button event subscriber lagged, dropping oldest");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

async fn monitor<I: ButtonInput>(
    mut input: I,
    buttons: Vec<ButtonSpec>,
    config: ButtonDriverConfig,
    events: broadcast::Sender<ButtonEvent>,
    mut shutdown: oneshot::Receiver<()>,
) -> I {
    let mut debouncers: Vec<Debouncer> = buttons
        .iter()
        .map(|_| Debouncer::new(config.debounce))
        .collect();
    let mut failing: HashSet<usize> = HashSet::new();
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        let now = tokio::time::Instant::now().into_std();
        for (pos, (button, debouncer)) in buttons.iter().zip(&mut debouncers).enumerate() {
            let level = match input.read_level(button.pin) {
                Ok(level) => {
                    if failing.remove(&pos) {
                        tracing::info!(button = %button.name, pin = %button.pin, "input readable again");
                    }
                    level
                }
                Err(err) => {
                    if failing.insert(pos) {
                        tracing::warn!(button = %button.name, pin = %button.pin, error = %err, "input read failed");
                    }
                    continue;
                }
            };

            if let Some(kind) = debouncer.update(button.polarity.is_active(level), now) {
                tracing::debug!(button = %button.name, %kind, "button event");
                let event = ButtonEvent::new(button.name.as_str(), button.pin.to_string(), kind)
                    .with_metadata("polarity", button.polarity.to_string());
                // no subscribers is fine
                let _ = events.send(event);
            }
        }
    }

    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedInput;
    use switchhub_domain::button::PinId;
    use switchhub_domain::event::ButtonEventKind;

    fn driver(input: &ScriptedInput) -> ButtonDriver<ScriptedInput> {
        ButtonDriver::new(input.clone(), ButtonDriverConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn should_emit_press_for_active_low_button() {
        let input = ScriptedInput::default();
        input.set(16, true);
        let mut driver = driver(&input);
        driver
            .add_buttons_from_spec("btn1:GPIO16:active-low:pull-up")
            .unwrap();
        driver.start().unwrap();
        let mut events = driver.events().unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        input.set(16, false);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let event = events.next().await.unwrap();
        assert_eq!(event.kind, ButtonEventKind::Press);
        assert_eq!(event.source, "btn1");
        assert_eq!(event.device, "GPIO16");
        assert_eq!(
            event.metadata.unwrap().get("polarity").map(String::as_str),
            Some("active-low")
        );

        driver.stop().await.unwrap();
        assert!(events.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_swallow_pulse_shorter_than_debounce() {
        let input = ScriptedInput::default();
        let mut driver = driver(&input);
        driver.add_buttons_from_spec("door:5").unwrap();
        driver.start().unwrap();
        let mut events = driver.events().unwrap();

        input.set(5, true);
        tokio::time::sleep(Duration::from_millis(20)).await;
        input.set(5, false);
        tokio::time::sleep(Duration::from_millis(200)).await;

        driver.stop().await.unwrap();
        assert!(events.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_emit_press_then_release() {
        let input = ScriptedInput::default();
        let mut driver = driver(&input);
        driver.add_buttons_from_spec("door:5").unwrap();
        driver.start().unwrap();
        let mut events = driver.events().unwrap();

        input.set(5, true);
        tokio::time::sleep(Duration::from_millis(100)).await;
        input.set(5, false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        driver.stop().await.unwrap();

        assert_eq!(events.next().await.unwrap().kind, ButtonEventKind::Press);
        assert_eq!(events.next().await.unwrap().kind, ButtonEventKind::Release);
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn should_refuse_second_start() {
        let input = ScriptedInput::default();
        let mut driver = driver(&input);
        driver.start().unwrap();

        let err = driver.start().unwrap_err();
        assert!(matches!(err, SwitchHubError::Usage(UsageError::DriverNotReady)));

        driver.stop().await.unwrap();
    }

    #[tokio::test]
    async fn should_refuse_to_add_buttons_while_running() {
        let input = ScriptedInput::default();
        let mut driver = driver(&input);
        driver.start().unwrap();

        let err = driver.add_buttons_from_spec("a:GPIO4").unwrap_err();
        assert!(matches!(err, SwitchHubError::Usage(UsageError::DriverNotReady)));

        driver.stop().await.unwrap();
    }

    #[tokio::test]
    async fn should_release_lines_on_stop_and_allow_restart() {
        let input = ScriptedInput::default();
        let mut driver = driver(&input);
        driver.add_buttons_from_spec("a:GPIO4,b:GPIO5").unwrap();

        driver.start().unwrap();
        assert_eq!(
            *input.claimed.lock().unwrap(),
            vec![PinId::new(4), PinId::new(5)]
        );
        driver.stop().await.unwrap();
        assert!(input.claimed.lock().unwrap().is_empty());
        assert!(!driver.is_running());

        driver.start().unwrap();
        assert!(driver.is_running());
        driver.stop().await.unwrap();
    }

    #[tokio::test]
    async fn should_treat_stop_without_start_as_no_op() {
        let input = ScriptedInput::default();
        let mut driver = driver(&input);
        assert!(driver.stop().await.is_ok());
    }

    #[tokio::test]
    async fn should_refuse_events_when_stopped() {
        let input = ScriptedInput::default();
        let driver = driver(&input);
        assert!(matches!(
            driver.events(),
            Err(SwitchHubError::Usage(UsageError::NotRunning))
        ));
    }

    #[tokio::test]
    async fn should_stay_restartable_after_claim_failure() {
        let input = ScriptedInput {
            refuse_claim: true,
            ..ScriptedInput::default()
        };
        let mut driver = driver(&input);

        assert!(matches!(driver.start(), Err(SwitchHubError::Driver(_))));
        assert!(!driver.is_running());
        assert!(matches!(driver.start(), Err(SwitchHubError::Driver(_))));
    }

    #[test]
    fn should_reject_button_duplicating_existing_pin() {
        let input = ScriptedInput::default();
        let mut driver = driver(&input);
        driver.add_buttons_from_spec("a:GPIO4").unwrap();

        let err = driver.add_buttons_from_spec("b:GPIO5,c:4").unwrap_err();
        assert!(matches!(
            err,
            SwitchHubError::Config(ConfigError::DuplicateButton { field: "pin", .. })
        ));
        assert_eq!(driver.buttons().len(), 1);
    }

    #[tokio::test]
    async fn should_refuse_to_start_with_zero_settings() {
        for config in [
            ButtonDriverConfig {
                poll_interval: Duration::ZERO,
                ..ButtonDriverConfig::default()
            },
            ButtonDriverConfig {
                channel_capacity: 0,
                ..ButtonDriverConfig::default()
            },
        ] {
            let input = ScriptedInput::default();
            let mut driver = ButtonDriver::new(input.clone(), config);
            driver.add_buttons_from_spec("a:GPIO4").unwrap();

            let err = driver.start().unwrap_err();
            assert!(matches!(
                err,
                SwitchHubError::Config(ConfigError::ZeroSetting { .. })
            ));
            assert!(!driver.is_running());
            assert!(input.claimed.lock().unwrap().is_empty());
        }
    }
}
