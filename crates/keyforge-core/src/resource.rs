//! External resource interface.
//!
//! The engine never talks to a lock service itself. An evaluator carries a
//! [`ResourceBuilder`] that turns a computed key into a [`Resource`]; the guard
//! driver acquires and releases it around the protected call.

use std::error::Error;
use std::sync::Arc;

/// Error type reported by resource collaborators
pub type ResourceError = Box<dyn Error + Send + Sync>;

/// A lock, semaphore or flow-control slot identified by a key
pub trait Resource: Send {
    fn key(&self) -> &str;

    /// # Errors
    ///
    /// Any failure to obtain the resource; the guarded call is not invoked.
    fn acquire(&mut self) -> Result<(), ResourceError>;

    /// # Errors
    ///
    /// Any failure to give the resource back; logged, never propagated.
    fn release(&mut self) -> Result<(), ResourceError>;
}

/// Factory attached to an evaluator by its post-compile hook
pub type ResourceBuilder =
    Arc<dyn Fn(&str) -> Result<Box<dyn Resource>, ResourceError> + Send + Sync>;

/// Wrap a closure as a [`ResourceBuilder`]
pub fn builder<F>(f: F) -> ResourceBuilder
where
    F: Fn(&str) -> Result<Box<dyn Resource>, ResourceError> + Send + Sync + 'static,
{
    Arc::new(f)
}
