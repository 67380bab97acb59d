//! System-wide key event tap
//!
//! Uses macOS CGEventTap to intercept key down/up events and hand them to
//! the remap filter. Other targets build, but the tap refuses to start.

#[cfg(target_os = "macos")]
mod macos;
mod manager;

pub use manager::{TapError, TapLocation, TapManager};
