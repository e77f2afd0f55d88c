//! One thread per call, with cooperative cancellation.
//!
//! Each accepted call runs the dispatch manager on a dedicated worker thread.
//! The supervisor remembers the cancellation token of every live call so an
//! administrative shutdown can stop them all; a worker removes its own entry
//! when its run loop ends.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::debug;

use switchboard_dialplan::{Call, CancellationToken, DispatchError, DispatchManager, Disposition};

const SUPERVISOR_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::supervisor");

type LiveCalls = Arc<Mutex<HashMap<u64, CancellationToken>>>;

/// Errors raised while supervising call threads.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The worker thread could not be started.
    #[error("failed to spawn call worker: {source}")]
    Spawn {
        /// Error reported by the thread builder.
        #[source]
        source: io::Error,
    },
    /// The worker thread panicked before producing a result.
    #[error("call worker for context '{context}' panicked")]
    ThreadPanic {
        /// Context the call was routed with.
        context: String,
    },
}

/// Runs calls on independent threads against one shared manager.
#[derive(Debug)]
pub struct CallSupervisor {
    manager: Arc<DispatchManager>,
    live: LiveCalls,
    next_id: AtomicU64,
}

impl CallSupervisor {
    /// Creates a supervisor over `manager`.
    #[must_use]
    pub fn new(manager: Arc<DispatchManager>) -> Self {
        Self {
            manager,
            live: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// The shared dispatch manager.
    #[must_use]
    pub fn manager(&self) -> &DispatchManager {
        &self.manager
    }

    /// Starts routing `call` on a new thread.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Spawn`] when the operating system refuses
    /// to start the thread.
    pub fn spawn(&self, call: Arc<Call>) -> Result<CallHandle, SupervisorError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        lock(&self.live).insert(id, cancel.clone());

        let context = call.context().to_owned();
        let manager = Arc::clone(&self.manager);
        let live = Arc::clone(&self.live);
        let token = cancel.clone();
        let spawned = thread::Builder::new()
            .name(format!("call-{id}"))
            .spawn(move || {
                let _entry = LiveEntry { live, id };
                manager.handle_with_cancellation(&call, &token)
            });

        match spawned {
            Ok(worker) => {
                debug!(target: SUPERVISOR_TARGET, call = id, context = %context, "call accepted");
                Ok(CallHandle {
                    context,
                    cancel,
                    worker: Some(worker),
                })
            }
            Err(source) => {
                lock(&self.live).remove(&id);
                Err(SupervisorError::Spawn { source })
            }
        }
    }

    /// Number of calls whose run loop has not finished.
    #[must_use]
    pub fn live_calls(&self) -> usize {
        lock(&self.live).len()
    }

    /// Requests cancellation of every live call.
    pub fn cancel_all(&self) {
        let live = lock(&self.live);
        debug!(target: SUPERVISOR_TARGET, calls = live.len(), "cancelling live calls");
        for token in live.values() {
            token.cancel();
        }
    }
}

/// Removes a call from the live set when its worker exits, even by panic.
struct LiveEntry {
    live: LiveCalls,
    id: u64,
}

impl Drop for LiveEntry {
    fn drop(&mut self) {
        lock(&self.live).remove(&self.id);
    }
}

fn lock(live: &LiveCalls) -> MutexGuard<'_, HashMap<u64, CancellationToken>> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to one supervised call.
///
/// Dropping the handle without joining cancels the call.
#[derive(Debug)]
pub struct CallHandle {
    context: String,
    cancel: CancellationToken,
    worker: Option<JoinHandle<Result<Disposition, DispatchError>>>,
}

impl CallHandle {
    /// Context the call was routed with.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Requests cancellation of this call.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the call's run loop to end.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::ThreadPanic`] when the worker panicked.
    pub fn join(mut self) -> Result<Result<Disposition, DispatchError>, SupervisorError> {
        let panicked = || SupervisorError::ThreadPanic {
            context: self.context.clone(),
        };
        let worker = self.worker.take().ok_or_else(panicked)?;
        worker.join().map_err(|_| panicked())
    }
}

impl Drop for CallHandle {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.cancel.cancel();
        }
    }
}
