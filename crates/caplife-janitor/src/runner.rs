//! Time-bounded execution of blocking store calls

use crate::JanitorError;
use caplife_domain::{ArtifactClass, CaptureStore, FaultKind, StoreFault};
use std::sync::Arc;
use std::time::Duration;

/// Failure of a single offloaded store call
#[derive(Debug)]
pub(crate) enum OpError<E> {
    /// The store reported an error
    Store(E),
    /// The call did not return within the operation timeout
    Timeout,
    /// The blocking task panicked or was cancelled
    Join(String),
}

impl<E: StoreFault> OpError<E> {
    /// Convert a failure that aborts a whole class pass
    pub(crate) fn into_pass_error(self, class: ArtifactClass, op: &'static str) -> JanitorError {
        match self {
            OpError::Store(e) if e.kind() == FaultKind::Structural => JanitorError::Structural {
                class,
                reason: e.to_string(),
            },
            OpError::Store(e) => JanitorError::Store {
                class,
                reason: e.to_string(),
            },
            OpError::Timeout => JanitorError::Timeout { class, op },
            OpError::Join(msg) => JanitorError::Worker(msg),
        }
    }
}

/// Runs store calls on the blocking pool, each bounded by a timeout
///
/// A call that times out keeps running on its blocking thread; its result is
/// discarded and the next pass re-reads the filesystem, which is authoritative.
pub(crate) struct BlockingStore<S> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S> Clone for BlockingStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<S: CaptureStore> BlockingStore<S> {
    pub(crate) fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub(crate) async fn call<T, F>(&self, f: F) -> Result<T, OpError<S::Error>>
    where
        F: FnOnce(&S) -> Result<T, S::Error> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || f(&store));
        match tokio::time::timeout(self.timeout, task).await {
            Err(_) => Err(OpError::Timeout),
            Ok(Err(join)) => Err(OpError::Join(join.to_string())),
            Ok(Ok(result)) => result.map_err(OpError::Store),
        }
    }
}
