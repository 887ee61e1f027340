use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio_util::sync::CancellationToken;

/// Broadcast-once stop request shared between a runner, its owner and its task.
///
/// Triggering is idempotent: the first call flips the signal, later calls are no-ops.
/// Once triggered, [`wait`](Self::wait) completes immediately for every clone, any number
/// of times.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns `true` only for the call that actually flipped the signal.
    pub fn trigger(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the signal has been triggered.
    pub async fn wait(&self) {
        self.token.cancelled().await
    }

    /// Owned variant of [`wait`](Self::wait) for APIs that need a `'static` future.
    pub fn wait_owned(&self) -> impl Future<Output = ()> + Send + 'static {
        self.token.clone().cancelled_owned()
    }
}
