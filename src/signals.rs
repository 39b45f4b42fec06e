//! Operator interrupt handling.
//!
//! Ctrl-C while a suite runs raises a stop flag that the engine checks at
//! the next step boundary. At the shell prompt the line editor reads Ctrl-C
//! itself, so the prompt is simply redrawn.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Install a SIGINT handler that sets `flag`.
pub fn install_interrupt_handler(flag: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
}

/// Check if an interrupt was requested and clear it.
pub fn take_interrupt(flag: &AtomicBool) -> bool {
    flag.swap(false, Ordering::SeqCst)
}
