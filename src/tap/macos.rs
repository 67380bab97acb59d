//! CGEventTap binding
//!
//! Everything in here runs on the tap thread. The filter, its counters and
//! the mach port used for re-enabling are `Rc`/`Cell` and never leave it.

use std::cell::OnceCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use core_foundation::base::TCFType;
use core_foundation::mach_port::{CFMachPort, CFMachPortRef};
use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventTapProxy, CGEventType, EventField,
};
use tracing::{error, info, trace};

use super::manager::{Readiness, SharedTapState, TapError, TapLocation, TapState};
use crate::remap::{
    Action, EventFilter, EventHandler, EventKind, KeyCode, KeyEvent, ModifierState, RemapTable,
    TapControl,
};
use crate::stats::TapStats;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

/// How long each run-loop slice lasts before the running flag is rechecked
const RUN_LOOP_SLICE: Duration = Duration::from_millis(100);

impl From<TapLocation> for CGEventTapLocation {
    fn from(location: TapLocation) -> Self {
        match location {
            TapLocation::Hid => CGEventTapLocation::HID,
            TapLocation::Session => CGEventTapLocation::Session,
        }
    }
}

fn event_kind(event_type: CGEventType) -> EventKind {
    match event_type {
        CGEventType::KeyDown => EventKind::KeyDown,
        CGEventType::KeyUp => EventKind::KeyUp,
        CGEventType::TapDisabledByTimeout => EventKind::TapDisabledByTimeout,
        CGEventType::TapDisabledByUserInput => EventKind::TapDisabledByUserInput,
        _ => EventKind::Other,
    }
}

/// A CGEvent seen through [`KeyEvent`]
struct CgKeyEvent<'a> {
    event: &'a CGEvent,
}

impl KeyEvent for CgKeyEvent<'_> {
    fn key_code(&self) -> Option<KeyCode> {
        KeyCode::from_raw(
            self.event
                .get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE),
        )
    }

    fn set_key_code(&mut self, code: KeyCode) {
        self.event
            .set_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE, code.to_raw());
    }

    fn modifiers(&self) -> ModifierState {
        ModifierState::from_flags(self.event.get_flags())
    }

    fn set_modifiers(&mut self, modifiers: ModifierState) {
        let mut flags = self.event.get_flags();
        modifiers.apply_to(&mut flags);
        self.event.set_flags(flags);
    }
}

/// Enables the one tap through its mach port.
///
/// The port is filled in after `CGEventTap::new` returns, because the
/// callback has to exist before the tap does.
#[derive(Clone)]
struct MachPortControl {
    port: Rc<OnceCell<CFMachPort>>,
    state: SharedTapState,
}

impl MachPortControl {
    fn set_enabled(&self, enabled: bool) {
        if let Some(port) = self.port.get() {
            // SAFETY: the port belongs to a live tap created on this thread
            unsafe { CGEventTapEnable(port.as_concrete_TypeRef(), enabled) };
        }
    }

    fn disable(&self) {
        self.set_enabled(false);
    }
}

impl TapControl for MachPortControl {
    fn enable(&self) {
        self.set_enabled(true);
        self.state.set(TapState::Enabled);
    }

    fn re_enable(&self) {
        self.state.set(TapState::Disabled);
        self.enable();
    }
}

/// Create the tap, run the CFRunLoop until `running` clears, then tear down.
///
/// Tap creation success or failure is sent on `ready` exactly once.
pub fn run_tap_loop(
    location: TapLocation,
    running: Arc<AtomicBool>,
    state: SharedTapState,
    ready: Readiness,
) -> TapStats {
    let port: Rc<OnceCell<CFMachPort>> = Rc::new(OnceCell::new());
    let control = MachPortControl {
        port: Rc::clone(&port),
        state: state.clone(),
    };
    let filter = Rc::new(EventFilter::new(RemapTable::hjkl(), control.clone()));

    // CGEventTap callback - must be fast and non-blocking
    let handler = Rc::clone(&filter);
    let callback = move |_proxy: CGEventTapProxy,
                         event_type: CGEventType,
                         event: &CGEvent|
                         -> Option<CGEvent> {
        let mut key_event = CgKeyEvent { event };
        let action = handler.handle(event_kind(event_type), &mut key_event);
        if let Action::Rewritten { from, to } = action {
            trace!(%from, %to, "key rewritten");
        }
        Some(event.clone())
    };

    let tap = match CGEventTap::new(
        location.into(),
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::Default,
        vec![CGEventType::KeyDown, CGEventType::KeyUp],
        callback,
    ) {
        Ok(tap) => tap,
        Err(()) => {
            error!(%location, "failed to create event tap - is Accessibility permission granted?");
            let _ = ready.send(Err(TapError::Creation));
            return filter.stats();
        }
    };

    let _ = port.set(tap.mach_port.clone());
    state.set(TapState::Created);

    let run_loop_source = match tap.mach_port.create_runloop_source(0) {
        Ok(source) => source,
        Err(()) => {
            error!("failed to create run loop source for event tap");
            let _ = ready.send(Err(TapError::RunLoopSource));
            state.set(TapState::Terminated);
            return filter.stats();
        }
    };

    let run_loop = CFRunLoop::get_current();
    run_loop.add_source(&run_loop_source, unsafe { kCFRunLoopCommonModes });

    control.enable();
    info!(%location, "event tap created and enabled");
    let _ = ready.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        let _ = CFRunLoop::run_in_mode(unsafe { kCFRunLoopDefaultMode }, RUN_LOOP_SLICE, false);
    }

    control.disable();
    run_loop.remove_source(&run_loop_source, unsafe { kCFRunLoopCommonModes });
    drop(tap);
    state.set(TapState::Terminated);
    info!("event tap released");

    filter.stats()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_graphics::event::CGEventFlags;
    use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

    struct NoopControl;

    impl TapControl for NoopControl {
        fn enable(&self) {}
    }

    fn key_down(code: KeyCode, flags: CGEventFlags) -> CGEvent {
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState).unwrap();
        let event = CGEvent::new_keyboard_event(source, code.0, true).unwrap();
        event.set_flags(flags);
        event
    }

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(event_kind(CGEventType::KeyDown), EventKind::KeyDown);
        assert_eq!(event_kind(CGEventType::KeyUp), EventKind::KeyUp);
        assert_eq!(
            event_kind(CGEventType::TapDisabledByTimeout),
            EventKind::TapDisabledByTimeout
        );
        assert_eq!(
            event_kind(CGEventType::TapDisabledByUserInput),
            EventKind::TapDisabledByUserInput
        );
        assert_eq!(event_kind(CGEventType::FlagsChanged), EventKind::Other);
    }

    #[test]
    fn test_cg_key_event_key_code_round_trip() {
        let event = key_down(KeyCode::H, CGEventFlags::CGEventFlagNull);
        let mut key_event = CgKeyEvent { event: &event };

        assert_eq!(key_event.key_code(), Some(KeyCode::H));
        key_event.set_key_code(KeyCode::LEFT_ARROW);
        assert_eq!(key_event.key_code(), Some(KeyCode::LEFT_ARROW));
    }

    #[test]
    fn test_cg_key_event_rewrite_keeps_untracked_flags() {
        let untracked = CGEventFlags::CGEventFlagSecondaryFn | CGEventFlags::CGEventFlagAlphaShift;
        let event = key_down(
            KeyCode::J,
            CGEventFlags::CGEventFlagCommand | CGEventFlags::CGEventFlagShift | untracked,
        );
        let filter = EventFilter::new(RemapTable::hjkl(), NoopControl);

        let action = filter.handle(EventKind::KeyDown, &mut CgKeyEvent { event: &event });

        assert_eq!(
            action,
            Action::Rewritten {
                from: KeyCode::J,
                to: KeyCode::DOWN_ARROW
            }
        );
        assert_eq!(
            event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE),
            KeyCode::DOWN_ARROW.to_raw()
        );
        assert_eq!(event.get_flags(), CGEventFlags::CGEventFlagShift | untracked);
    }
}
