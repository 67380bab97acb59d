//! Process lifecycle: startup failures and shutdown signals

mod exit;
mod shutdown;

pub use exit::{ensure_capability, Failure};
pub use shutdown::ShutdownSignal;
