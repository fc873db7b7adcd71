//! Cooperative cancellation shared between a driver and long-running stages.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{Result, error::TrailnetError};

/// Cloneable flag that long-running stages poll between units of work.
///
/// # Examples
/// ```
/// use trailnet_core::{CancellationToken, TrailnetError};
///
/// let token = CancellationToken::new();
/// let observer = token.clone();
/// assert!(observer.check().is_ok());
/// token.cancel();
/// assert_eq!(observer.check(), Err(TrailnetError::Cancelled));
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Every clone observes the request.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Fails with [`TrailnetError::Cancelled`] once cancellation was requested.
    ///
    /// # Errors
    /// Returns [`TrailnetError::Cancelled`] after [`Self::cancel`] was called.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(TrailnetError::Cancelled)
        } else {
            Ok(())
        }
    }
}
