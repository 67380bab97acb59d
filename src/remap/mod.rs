//! Remap module: Command+H/J/K/L to arrow keys
//!
//! Holds the fixed key table and the per-event rewrite decision. Nothing
//! here touches the OS, so the whole decision path is unit-testable.

mod filter;
mod keys;
mod table;

pub use filter::{Action, EventFilter, EventHandler, EventKind, KeyEvent, TapControl};
pub use keys::{KeyCode, ModifierState};
pub use table::RemapTable;
