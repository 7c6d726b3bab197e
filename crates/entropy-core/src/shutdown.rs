//! Process-wide shutdown coordination.
//!
//! A single atomic boolean starts `true`; a background thread watching
//! SIGINT/SIGTERM/SIGQUIT/SIGTSTP flips it to `false` on the first signal.
//! Workers poll it cooperatively — nothing is abandoned mid-flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM, SIGTSTP};
use signal_hook::iterator::Signals;

use crate::error::{EntropyError, Result};

/// Shared runnable flag plus the signal-watching thread backing it.
#[derive(Clone)]
pub struct Shutdown {
    runnable: Arc<AtomicBool>,
}

impl Shutdown {
    /// Spawn a thread that watches SIGINT/SIGTERM/SIGQUIT/SIGTSTP and clears
    /// the flag on the first one received. Mirrors the reference
    /// implementation's four-signal coverage.
    pub fn install() -> Result<Self> {
        let runnable = Arc::new(AtomicBool::new(true));
        let mut signals = Signals::new([SIGINT, SIGTERM, SIGQUIT, SIGTSTP])
            .map_err(|e| EntropyError::AllocationFailure(format!("signal handler: {e}")))?;
        let flag = Arc::clone(&runnable);
        std::thread::spawn(move || {
            if let Some(signal) = signals.forever().next() {
                log::info!("received signal {signal}, shutting down");
                flag.store(false, Ordering::SeqCst);
            }
        });
        Ok(Self { runnable })
    }

    /// For tests: a flag with no signal-watching thread attached.
    pub fn manual() -> Self {
        Self {
            runnable: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_runnable(&self) -> bool {
        self.runnable.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.runnable.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_shutdown_starts_runnable_and_can_be_stopped() {
        let sd = Shutdown::manual();
        assert!(sd.is_runnable());
        sd.stop();
        assert!(!sd.is_runnable());
    }
}
