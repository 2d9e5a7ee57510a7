//! Timer registry — at most one delayed action per switch or group.
//!
//! Arming a key that already has a pending timer aborts the old one. Fire and
//! cancel race under the registry lock: whichever removes the slot first wins,
//! so a cancelled timer never runs and a fired timer is never reported as
//! cancelled.
//!
//! Each key also has a gate. A firing timer holds it from the moment it claims
//! its slot until its action returns, and callers wrap their own
//! cancel-set-arm sequence in [`TimerRegistry::exclusive`], so an auto-off
//! never interleaves with a command on the same target.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use switchhub_domain::error::{InvalidHold, SwitchHubError};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Longest delay a timer accepts (one year).
pub const MAX_HOLD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Reject delays longer than [`MAX_HOLD`].
///
/// # Errors
///
/// Returns [`InvalidHold`] when `delay` exceeds the maximum.
pub fn check_hold(delay: Duration) -> Result<(), InvalidHold> {
    if delay > MAX_HOLD {
        return Err(InvalidHold {
            requested_secs: delay.as_secs(),
            max_secs: MAX_HOLD.as_secs(),
        });
    }
    Ok(())
}

fn deadline_after(delay: Duration) -> Result<Instant, InvalidHold> {
    check_hold(delay)?;
    Instant::now().checked_add(delay).ok_or(InvalidHold {
        requested_secs: delay.as_secs(),
        max_secs: MAX_HOLD.as_secs(),
    })
}

/// Target of a timer. Switches and groups live in separate namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKey {
    Switch(String),
    Group(String),
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch(name) => write!(f, "switch:{name}"),
            Self::Group(name) => write!(f, "group:{name}"),
        }
    }
}

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerAction {
    TurnOn,
    TurnOff,
}

impl TimerAction {
    /// The action that drives a target to `on`.
    #[must_use]
    pub fn to_state(on: bool) -> Self {
        if on { Self::TurnOn } else { Self::TurnOff }
    }
}

/// Snapshot of a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub action: TimerAction,
    pub deadline: Instant,
}

impl PendingTimer {
    /// Time left before the timer fires, zero once overdue.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

struct Slot {
    generation: u64,
    timer: PendingTimer,
    handle: JoinHandle<()>,
}

type Slots = Arc<Mutex<HashMap<TimerKey, Slot>>>;
type Gate = Arc<Mutex<()>>;

/// Map of key to cancellable delayed task.
#[derive(Default)]
pub struct TimerRegistry {
    slots: Slots,
    gates: Mutex<HashMap<TimerKey, Gate>>,
    generation: AtomicU64,
}

impl TimerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn gate(&self, key: &TimerKey) -> Gate {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(key.clone()).or_default())
    }

    /// Run `f` while holding the gate of `key`.
    ///
    /// A timer for `key` that is due meanwhile waits for `f` to return before
    /// it claims its slot, and a timer already running its action makes `f`
    /// wait. `f` may call [`arm`](Self::arm) and [`cancel`](Self::cancel) but
    /// must not call `exclusive` for the same key.
    pub fn exclusive<R>(&self, key: &TimerKey, f: impl FnOnce() -> R) -> R {
        let gate = self.gate(key);
        let _held = gate.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Schedule `run` after `delay`, replacing any timer pending for `key`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHold`] when `delay` exceeds [`MAX_HOLD`]; any timer
    /// already pending for `key` is left untouched.
    pub fn arm<F>(
        &self,
        key: TimerKey,
        delay: Duration,
        action: TimerAction,
        run: F,
    ) -> Result<PendingTimer, SwitchHubError>
    where
        F: FnOnce() -> Result<(), SwitchHubError> + Send + 'static,
    {
        let timer = PendingTimer {
            action,
            deadline: deadline_after(delay)?,
        };
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let gate = self.gate(&key);

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = tokio::spawn(fire(
            Arc::clone(&self.slots),
            gate,
            key.clone(),
            generation,
            timer,
            run,
        ));
        if let Some(previous) = slots.insert(
            key.clone(),
            Slot {
                generation,
                timer,
                handle,
            },
        ) {
            previous.handle.abort();
            tracing::debug!(%key, "superseded pending timer");
        }
        tracing::debug!(%key, ?action, ?delay, "armed timer");
        Ok(timer)
    }

    /// Abort the timer pending for `key`. Returns `false` if there was none.
    pub fn cancel(&self, key: &TimerKey) -> bool {
        let removed = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        match removed {
            Some(slot) => {
                slot.handle.abort();
                tracing::debug!(%key, "cancelled timer");
                true
            }
            None => false,
        }
    }

    /// The timer pending for `key`, if any.
    #[must_use]
    pub fn pending(&self, key: &TimerKey) -> Option<PendingTimer> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|slot| slot.timer)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort every pending timer.
    pub fn cancel_all(&self) {
        let drained: Vec<Slot> = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, slot)| slot)
            .collect();
        for slot in drained {
            slot.handle.abort();
        }
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn fire<F>(slots: Slots, gate: Gate, key: TimerKey, generation: u64, timer: PendingTimer, run: F)
where
    F: FnOnce() -> Result<(), SwitchHubError>,
{
    tokio::time::sleep_until(timer.deadline).await;

    // Held until the action returns; no await below this point.
    let _held = gate.lock().unwrap_or_else(PoisonError::into_inner);
    let ours = {
        let mut slots = slots.lock().unwrap_or_else(PoisonError::into_inner);
        match slots.get(&key) {
            Some(slot) if slot.generation == generation => slots.remove(&key).is_some(),
            _ => false,
        }
    };
    if !ours {
        return;
    }

    match run() {
        Ok(()) => tracing::info!(%key, action = ?timer.action, "timer fired"),
        Err(err) => tracing::error!(%key, action = ?timer.action, error = %err, "timer action failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() -> Result<(), SwitchHubError> + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&count);
        let make = move || {
            let shared = Arc::clone(&shared);
            Box::new(move || {
                shared.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }) as Box<dyn FnOnce() -> Result<(), SwitchHubError> + Send>
        };
        (count, make)
    }

    fn lamp() -> TimerKey {
        TimerKey::Switch("lamp".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn should_fire_once_after_delay() {
        let registry = TimerRegistry::new();
        let (count, make) = counter();

        registry.arm(lamp(), Duration::from_secs(5), TimerAction::TurnOff, make()).unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(registry.pending(&lamp()).is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.pending(&lamp()).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_supersede_timer_for_same_key() {
        let registry = TimerRegistry::new();
        let (count, make) = counter();

        registry.arm(lamp(), Duration::from_secs(5), TimerAction::TurnOff, make()).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        registry.arm(lamp(), Duration::from_secs(10), TimerAction::TurnOn, make()).unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(registry.pending(&lamp()).unwrap().action, TimerAction::TurnOn);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_fire_after_cancel() {
        let registry = TimerRegistry::new();
        let (count, make) = counter();

        registry.arm(lamp(), Duration::from_secs(5), TimerAction::TurnOff, make()).unwrap();
        assert!(registry.cancel(&lamp()));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_treat_cancel_of_unknown_key_as_no_op() {
        let registry = TimerRegistry::new();
        assert!(!registry.cancel(&lamp()));
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_switch_and_group_keys_apart() {
        let registry = TimerRegistry::new();
        let (count, make) = counter();
        let group = TimerKey::Group("lamp".to_string());

        registry.arm(lamp(), Duration::from_secs(5), TimerAction::TurnOff, make()).unwrap();
        registry.arm(group.clone(), Duration::from_secs(5), TimerAction::TurnOff, make()).unwrap();
        assert_eq!(registry.len(), 2);

        registry.cancel(&group);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_remaining_time() {
        let registry = TimerRegistry::new();
        let (_, make) = counter();

        registry.arm(lamp(), Duration::from_secs(30), TimerAction::TurnOff, make()).unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let remaining = registry.pending(&lamp()).unwrap().remaining();
        assert!(remaining <= Duration::from_secs(20));
        assert!(remaining > Duration::from_secs(19));
    }

    #[tokio::test(start_paused = true)]
    async fn should_abort_outstanding_timers_on_drop() {
        let (count, make) = counter();
        {
            let registry = TimerRegistry::new();
            registry.arm(lamp(), Duration::from_secs(1), TimerAction::TurnOff, make()).unwrap();
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_reject_hold_past_maximum_without_touching_pending_timer() {
        let registry = TimerRegistry::new();
        let (_, make) = counter();
        registry.arm(lamp(), Duration::from_secs(5), TimerAction::TurnOff, make()).unwrap();

        let err = registry
            .arm(lamp(), Duration::from_secs(u64::MAX), TimerAction::TurnOn, make())
            .unwrap_err();

        assert!(matches!(err, SwitchHubError::InvalidHold(_)));
        assert_eq!(registry.pending(&lamp()).unwrap().action, TimerAction::TurnOff);
    }

    #[test]
    fn should_accept_hold_up_to_maximum() {
        assert!(check_hold(MAX_HOLD).is_ok());
        assert_eq!(
            check_hold(MAX_HOLD + Duration::from_secs(1)),
            Err(InvalidHold {
                requested_secs: MAX_HOLD.as_secs() + 1,
                max_secs: MAX_HOLD.as_secs(),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_hold_due_timer_back_while_key_is_exclusive() {
        let registry = TimerRegistry::new();
        let (count, make) = counter();
        registry.arm(lamp(), Duration::from_secs(1), TimerAction::TurnOff, make()).unwrap();

        // Re-arming inside the gate replaces the due timer before it can claim its slot.
        registry.exclusive(&lamp(), || {
            assert!(registry.cancel(&lamp()));
            registry
                .arm(lamp(), Duration::from_secs(10), TimerAction::TurnOn, make())
                .unwrap();
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(registry.pending(&lamp()).unwrap().action, TimerAction::TurnOn);
    }

    #[test]
    fn should_format_keys_with_namespace() {
        assert_eq!(lamp().to_string(), "switch:lamp");
        assert_eq!(TimerKey::Group("all".to_string()).to_string(), "group:all");
    }
}
