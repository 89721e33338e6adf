//! Deadline-bounded calls into player implementations
//!
//! Each call runs on its own worker thread. The referee waits on a channel
//! for at most the configured timeout and then walks away; a worker that is
//! still running is left to finish on its own and its answer is dropped.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{CallFailure, PlayerResult};
use crate::player::Player;

/// Shared handle to one player implementation
#[derive(Clone)]
pub(crate) struct PlayerHandle {
    inner: Arc<Mutex<Box<dyn Player>>>,
}

impl PlayerHandle {
    pub(crate) fn new(player: Box<dyn Player>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(player)),
        }
    }

    /// Run `f` against the player, giving up after `timeout`
    ///
    /// A player still busy with an earlier abandoned call holds the lock, so
    /// the new call times out too.
    pub(crate) fn call<T, F>(&self, timeout: Duration, f: F) -> Result<T, CallFailure>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Player) -> PlayerResult<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let player = Arc::clone(&self.inner);

        thread::Builder::new()
            .name("hexfish-player".into())
            .spawn(move || {
                let mut guard = player.lock();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&mut **guard)));
                // The receiver is gone if the referee already gave up
                let _ = tx.send(outcome);
            })
            .map_err(|e| CallFailure::Spawn(e.to_string()))?;

        match rx.recv_timeout(timeout) {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(err))) => Err(CallFailure::Responded(err)),
            Ok(Err(_)) | Err(RecvTimeoutError::Disconnected) => Err(CallFailure::Panicked),
            Err(RecvTimeoutError::Timeout) => Err(CallFailure::Timeout(timeout)),
        }
    }

    /// Fire a notification that needs no answer
    pub(crate) fn notify<F>(&self, timeout: Duration, f: F) -> Result<(), CallFailure>
    where
        F: FnOnce(&mut dyn Player) + Send + 'static,
    {
        self.call(timeout, move |player| {
            f(player);
            Ok(())
        })
    }
}
