//! # Fleet-wide shutdown latch.
//!
//! [`Shutdown`] is a one-shot, idempotent broadcast. The first [`Shutdown::request`]
//! cancels the shared [`CancellationToken`] and releases the interrupt
//! [`Registration`]; every later request is a no-op.
//!
//! ## Interrupts
//! [`Shutdown::trap_interrupts`] turns the first `SIGINT` or `SIGTERM` into a
//! request. Releasing the registration restores the default disposition of
//! both signals, so a second interrupt terminates the supervisor immediately.
//!
//! ```text
//! SIGINT ──► listener task ──► request() ──► token.cancel()
//!                                        └─► registration.release()
//!                                               ├─► abort listener
//!                                               └─► SIGINT/SIGTERM = SIG_DFL
//! ```
//!
//! Tokio keeps its own signal handler state for the lifetime of the process:
//! once the default disposition is restored, trapping again in the same
//! process does not observe further signals.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use nix::sys::signal::{self, SigHandler, Signal};
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Undo action run when the latch trips.
pub struct Registration {
    release: Box<dyn FnOnce() + Send>,
}

impl Registration {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Box::new(release),
        }
    }

    fn release(self) {
        (self.release)()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Registration")
    }
}

/// One-shot shutdown broadcast shared by every instance supervisor.
#[derive(Debug, Default)]
pub struct Shutdown {
    token: CancellationToken,
    tripped: AtomicBool,
    registration: Mutex<Option<Registration>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the latch. Only the first call has an effect.
    pub fn request(&self) {
        if self.tripped.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("shutdown requested");
        self.token.cancel();
        if let Some(registration) = self.slot().take() {
            registration.release();
        }
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Read side handed to the supervisors. Never cancel it directly.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stores the action to run when the latch trips.
    ///
    /// A previous registration is released first. If the latch is already
    /// set, `registration` is released at once.
    pub fn register(&self, registration: Registration) {
        let previous = {
            let mut slot = self.slot();
            if self.is_set() {
                Some(registration)
            } else {
                slot.replace(registration)
            }
        };
        if let Some(previous) = previous {
            previous.release();
        }
    }

    /// Converts the first `SIGINT` or `SIGTERM` into [`Shutdown::request`].
    ///
    /// Must be called from within a Tokio runtime.
    pub fn trap_interrupts(self: &Arc<Self>) -> io::Result<()> {
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let weak = Arc::downgrade(self);
        let listener = tokio::spawn(async move {
            let name = tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            };
            debug!(signal = name, "interrupt received");
            if let Some(shutdown) = weak.upgrade() {
                shutdown.request();
            }
        });

        let abort = listener.abort_handle();
        self.register(Registration::new(move || {
            abort.abort();
            restore_default(Signal::SIGINT);
            restore_default(Signal::SIGTERM);
        }));
        Ok(())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Registration>> {
        self.registration.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn restore_default(sig: Signal) {
    // SAFETY: installing SIG_DFL does not run any handler code.
    if let Err(errno) = unsafe { signal::signal(sig, SigHandler::SigDfl) } {
        warn!(signal = sig.as_str(), %errno, "cannot restore default signal disposition");
    }
}
