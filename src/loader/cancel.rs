use std::{fmt, sync::{atomic::{AtomicBool, Ordering}, Arc}};

use anyhow::Result;

/// Error returned when a load is abandoned through its [`CancelToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("load cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Shared cancellation flag, checked between batches and stages.
/// Fetches already in flight run to completion; their results are dropped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self { Self::default() }

    #[inline] pub fn cancel(&self) { self.0.store(true, Ordering::Release) }

    #[inline] pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Acquire) }

    /// Fail with [`Cancelled`] once the token has been cancelled.
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() { return Err(Cancelled.into()) }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());
        other.cancel();
        assert!(token.is_cancelled());
        let err = token.check().unwrap_err();
        assert!(err.is::<Cancelled>());
    }
}
