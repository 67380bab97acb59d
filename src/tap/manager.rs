//! Event tap lifecycle
//!
//! Owns the single system-wide tap for the life of the process. The tap
//! lives on a dedicated thread that runs its own CFRunLoop; the main task
//! only starts it, observes its state, and stops it on shutdown.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use crate::stats::TapStats;

#[cfg(target_os = "macos")]
use super::macos as platform;

/// Where in the event stream the tap is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TapLocation {
    /// Where HID system events enter the window server
    #[default]
    Hid,
    /// Where HID and remote-control events enter a login session
    Session,
}

impl FromStr for TapLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hid" => Ok(Self::Hid),
            "session" => Ok(Self::Session),
            other => Err(format!("unknown tap location '{other}' (expected 'hid' or 'session')")),
        }
    }
}

impl fmt::Display for TapLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapLocation::Hid => write!(f, "hid"),
            TapLocation::Session => write!(f, "session"),
        }
    }
}

/// Lifecycle state of the tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TapState {
    Uninitialized = 0,
    Created = 1,
    Enabled = 2,
    /// Disabled by the system; re-enabled from inside the callback
    Disabled = 3,
    Terminated = 4,
}

impl TapState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Created,
            2 => Self::Enabled,
            3 => Self::Disabled,
            4 => Self::Terminated,
            _ => Self::Uninitialized,
        }
    }
}

/// Tap state readable from any thread
#[derive(Debug, Clone)]
pub struct SharedTapState(Arc<AtomicU8>);

impl SharedTapState {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(TapState::Uninitialized as u8)))
    }

    pub fn get(&self) -> TapState {
        TapState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: TapState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

impl Default for SharedTapState {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur while bringing up the event tap
#[derive(Debug, Clone, thiserror::Error)]
pub enum TapError {
    #[error("event tap is already running")]
    AlreadyRunning,

    #[error("failed to create event tap")]
    Creation,

    #[error("failed to create run loop source for event tap")]
    RunLoopSource,

    #[error("failed to spawn tap thread: {0}")]
    ThreadSpawn(String),

    #[error("tap thread exited before reporting readiness")]
    ThreadExited,

    #[error("key event taps are only supported on macOS")]
    Unsupported,
}

/// Outcome of tap creation, reported once by the tap thread
pub type Readiness = mpsc::Sender<Result<(), TapError>>;

/// Owner of the process-wide event tap
pub struct TapManager {
    location: TapLocation,
    running: Arc<AtomicBool>,
    state: SharedTapState,
    thread: Option<JoinHandle<TapStats>>,
}

impl TapManager {
    /// Create a manager; no tap exists until [`TapManager::start`]
    pub fn new(location: TapLocation) -> Self {
        Self {
            location,
            running: Arc::new(AtomicBool::new(false)),
            state: SharedTapState::new(),
            thread: None,
        }
    }

    /// Create and enable the tap on its own run-loop thread.
    ///
    /// Blocks until the thread reports whether the OS accepted the tap, so a
    /// failure here means no interception is active.
    pub fn start(&mut self) -> Result<(), TapError> {
        if self.thread.is_some() || self.running.swap(true, Ordering::SeqCst) {
            return Err(TapError::AlreadyRunning);
        }

        let (ready_tx, ready_rx) = mpsc::channel();
        let location = self.location;
        let running = Arc::clone(&self.running);
        let state = self.state.clone();

        let spawned = thread::Builder::new()
            .name("remap-tap".to_string())
            .spawn(move || {
                info!("tap thread started");
                let stats = platform::run_tap_loop(location, running.clone(), state, ready_tx);
                running.store(false, Ordering::SeqCst);
                info!("tap thread stopped");
                stats
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(TapError::ThreadSpawn(e.to_string()));
            }
        };

        let outcome = ready_rx.recv().unwrap_or(Err(TapError::ThreadExited));
        if let Err(e) = outcome {
            self.running.store(false, Ordering::SeqCst);
            if handle.join().is_err() {
                error!("tap thread panicked during startup");
            }
            return Err(e);
        }

        self.thread = Some(handle);
        Ok(())
    }

    /// Stop the run loop, release the tap, and return final counters
    pub fn stop(&mut self) -> TapStats {
        self.running.store(false, Ordering::SeqCst);

        match self.thread.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                error!("tap thread panicked");
                TapStats::default()
            }),
            None => TapStats::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> TapState {
        self.state.get()
    }

    pub fn location(&self) -> TapLocation {
        self.location
    }
}

impl Drop for TapManager {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop();
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    use super::*;

    pub fn run_tap_loop(
        _location: TapLocation,
        _running: Arc<AtomicBool>,
        _state: SharedTapState,
        ready: Readiness,
    ) -> TapStats {
        let _ = ready.send(Err(TapError::Unsupported));
        TapStats::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_creation() {
        let manager = TapManager::new(TapLocation::Hid);
        assert!(!manager.is_running());
        assert_eq!(manager.state(), TapState::Uninitialized);
        assert_eq!(manager.location(), TapLocation::Hid);
    }

    #[test]
    fn test_stop_without_start() {
        let mut manager = TapManager::new(TapLocation::Session);
        assert_eq!(manager.stop(), TapStats::default());
        assert!(!manager.is_running());
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_start_unsupported_platform() {
        let mut manager = TapManager::new(TapLocation::Hid);
        assert!(matches!(manager.start(), Err(TapError::Unsupported)));
        assert!(!manager.is_running());
        assert_eq!(manager.state(), TapState::Uninitialized);
    }

    #[cfg(not(target_os = "macos"))]
    #[tokio::test]
    async fn test_start_and_stop_on_blocking_pool() {
        let started = tokio::task::spawn_blocking(|| {
            let mut manager = TapManager::new(TapLocation::Hid);
            manager.start().map(|()| manager)
        })
        .await
        .unwrap();
        assert!(matches!(started, Err(TapError::Unsupported)));

        let mut manager = TapManager::new(TapLocation::Hid);
        let stats = tokio::task::spawn_blocking(move || manager.stop())
            .await
            .unwrap();
        assert_eq!(stats, TapStats::default());
    }

    #[test]
    fn test_shared_state_round_trip() {
        let state = SharedTapState::new();
        let observer = state.clone();
        for next in [
            TapState::Created,
            TapState::Enabled,
            TapState::Disabled,
            TapState::Enabled,
            TapState::Terminated,
        ] {
            state.set(next);
            assert_eq!(observer.get(), next);
        }
    }

    #[test]
    fn test_tap_location_parse() {
        assert_eq!("hid".parse::<TapLocation>(), Ok(TapLocation::Hid));
        assert_eq!(" Session ".parse::<TapLocation>(), Ok(TapLocation::Session));
        assert!("annotated".parse::<TapLocation>().is_err());
        assert_eq!(TapLocation::default().to_string(), "hid");
    }
}
