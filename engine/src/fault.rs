//! Capturing failures raised by user-supplied callbacks.
//!
//! Sanitize, upgrade, downgrade and detector callbacks are caller code. Both
//! returned errors and panics are turned into a [`Fault`] at the boundary so
//! they never unwind through the engine.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// A failure raised by a user callback.
pub type Fault = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A callback panicked instead of returning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("callback panicked: {message}")]
pub struct Panicked {
    /// The panic message, when the payload carried one.
    pub message: String,
}

impl Panicked {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}

/// Run a fallible callback, converting a panic into a [`Panicked`] fault.
pub(crate) fn guard<T>(f: impl FnOnce() -> Result<T, Fault>) -> Result<T, Fault> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(Box::new(Panicked::from_payload(payload))),
    }
}

/// Run an infallible callback, converting a panic into a [`Panicked`] fault.
pub(crate) fn guard_infallible<T>(f: impl FnOnce() -> T) -> Result<T, Fault> {
    guard(|| Ok(f()))
}
