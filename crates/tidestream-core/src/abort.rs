//! Cancellation signal shared between a session and whoever may abort it.

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

use crate::error::CancelReason;

/// Clonable handle that aborts a streamed request.
///
/// The first reason recorded wins, so a timeout racing a user abort is
/// reported as whichever fired first.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort on behalf of the caller.
    pub fn abort(&self) {
        self.abort_with(CancelReason::User);
    }

    pub fn abort_with(&self, reason: CancelReason) {
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().copied()
    }

    /// Resolves once the handle is aborted.
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }
}
