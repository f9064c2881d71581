//! Process-wide trading kill switch.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Callback fired exactly once per activation, with a human-readable
/// cause.
pub type KillSwitchListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Monotonic trading halt flag.
///
/// Activation is idempotent and sequentially consistent: once engaged,
/// the flag stays set until an explicit [`KillSwitch::deactivate`] call.
/// The configured listener fires only on the activation that actually
/// flipped the flag.
pub struct KillSwitch {
    engaged: AtomicBool,
    activations: AtomicU64,
    listener: Mutex<Option<KillSwitchListener>>,
}

impl KillSwitch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            engaged: AtomicBool::new(false),
            activations: AtomicU64::new(0),
            listener: Mutex::new(None),
        }
    }

    /// Install the activation callback, replacing any previous one.
    pub fn set_listener(&self, listener: KillSwitchListener) {
        if let Ok(mut slot) = self.listener.lock() {
            *slot = Some(listener);
        }
    }

    /// Engage the switch. Only the call that flips the flag fires the
    /// listener; repeat activations are no-ops.
    pub fn activate(&self, reason: &str) {
        if self
            .engaged
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        self.activations.fetch_add(1, Ordering::Relaxed);
        error!("kill switch engaged: {}", reason);

        let listener = self
            .listener
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(Arc::clone));
        if let Some(listener) = listener {
            listener(reason);
        }
    }

    /// Clear the switch. Returns whether it was engaged.
    pub fn deactivate(&self) -> bool {
        let was_engaged = self.engaged.swap(false, Ordering::SeqCst);
        if was_engaged {
            info!("kill switch deactivated");
        }
        was_engaged
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }

    /// Number of times the switch has been engaged since construction.
    #[must_use]
    pub fn activation_count(&self) -> u64 {
        self.activations.load(Ordering::Relaxed)
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}
