//! Per-event remap decision
//!
//! Runs synchronously inside the tap callback for every delivered event.
//! Must stay cheap: the OS disables taps whose callbacks are slow.

use std::fmt;

use tracing::debug;

use super::keys::{KeyCode, ModifierState};
use super::table::RemapTable;
use crate::stats::{TapCounters, TapStats};

/// Category of an event delivered to the tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    KeyDown,
    KeyUp,
    /// The OS disabled the tap because the callback was too slow
    TapDisabledByTimeout,
    /// The tap was disabled by user input or another process
    TapDisabledByUserInput,
    /// Anything else
    Other,
}

impl EventKind {
    pub fn is_key(self) -> bool {
        matches!(self, EventKind::KeyDown | EventKind::KeyUp)
    }

    pub fn is_tap_disabled(self) -> bool {
        matches!(
            self,
            EventKind::TapDisabledByTimeout | EventKind::TapDisabledByUserInput
        )
    }
}

/// What the filter did with an event
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Event left untouched
    PassThrough,
    /// Tap re-enable was requested; event left untouched
    ReEnabled,
    /// Key code and modifiers were rewritten in place
    Rewritten { from: KeyCode, to: KeyCode },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::PassThrough => write!(f, "PASS_THROUGH"),
            Action::ReEnabled => write!(f, "RE_ENABLED"),
            Action::Rewritten { from, to } => write!(f, "REWRITTEN ({} -> {})", from, to),
        }
    }
}

/// Read/write access to the fields of one key event
pub trait KeyEvent {
    /// `None` when the raw key code field does not name a key
    fn key_code(&self) -> Option<KeyCode>;
    fn set_key_code(&mut self, code: KeyCode);
    fn modifiers(&self) -> ModifierState;
    fn set_modifiers(&mut self, modifiers: ModifierState);
}

/// Control over the live tap, as seen from inside its callback
pub trait TapControl {
    /// Activate the tap. Idempotent.
    fn enable(&self);

    /// Re-activate after the OS disabled the tap
    fn re_enable(&self) {
        self.enable();
    }
}

/// Callback registered with the run loop
pub trait EventHandler<E: KeyEvent> {
    fn handle(&self, kind: EventKind, event: &mut E) -> Action;
}

/// Rewrites Command+H/J/K/L into arrow keys
pub struct EventFilter<C> {
    table: RemapTable,
    control: C,
    counters: TapCounters,
}

impl<C: TapControl> EventFilter<C> {
    pub fn new(table: RemapTable, control: C) -> Self {
        Self {
            table,
            control,
            counters: TapCounters::new(),
        }
    }

    pub fn stats(&self) -> TapStats {
        self.counters.snapshot()
    }

    fn rewrite<E: KeyEvent>(&self, event: &mut E) -> Action {
        let modifiers = event.modifiers();
        if !modifiers.activates_remap() {
            return Action::PassThrough;
        }

        let Some(source) = event.key_code() else {
            return Action::PassThrough;
        };
        let Some(target) = self.table.lookup(source) else {
            return Action::PassThrough;
        };

        event.set_key_code(target);
        // shift survives so Command+Shift+H extends a selection
        event.set_modifiers(modifiers.without_command());
        self.counters.record_rewritten();

        Action::Rewritten {
            from: source,
            to: target,
        }
    }
}

impl<C: TapControl, E: KeyEvent> EventHandler<E> for EventFilter<C> {
    fn handle(&self, kind: EventKind, event: &mut E) -> Action {
        self.counters.record_observed();

        if kind.is_tap_disabled() {
            self.control.re_enable();
            self.counters.record_re_enabled();
            debug!(?kind, "event tap disabled by the system, re-enabled");
            return Action::ReEnabled;
        }

        if !kind.is_key() {
            return Action::PassThrough;
        }

        self.rewrite(event)
    }
}
