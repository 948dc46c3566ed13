//! Single-assignment completion handle for one background encode.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// A value a handle can resolve to.
///
/// `abandoned` is what the handle yields if the worker went away without
/// reporting, so a handle always resolves.
pub trait Resolution: Send + 'static {
    fn abandoned() -> Self;
}

/// Eventual outcome of one encode-and-persist operation.
///
/// Pending until the worker reports, then resolved for good. Resolution
/// never fails at this level; failures of the work itself are part of `T`.
/// Dropping the handle does not cancel the work.
#[must_use = "the outcome is only observable through the handle"]
#[derive(Debug)]
pub struct EncodeHandle<T> {
    rx: Receiver<T>,
    resolved: Option<T>,
}

impl<T: Resolution> EncodeHandle<T> {
    pub(crate) fn channel() -> (Sender<T>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx, resolved: None })
    }

    /// Non-blocking check. Returns the outcome once resolved.
    pub fn poll(&mut self) -> Option<&T> {
        if self.resolved.is_none() {
            match self.rx.try_recv() {
                Ok(value) => self.resolved = Some(value),
                Err(TryRecvError::Disconnected) => self.resolved = Some(T::abandoned()),
                Err(TryRecvError::Empty) => {}
            }
        }
        self.resolved.as_ref()
    }

    pub fn is_resolved(&mut self) -> bool {
        self.poll().is_some()
    }

    /// Block for at most `timeout`. `None` means still pending.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<&T> {
        if self.resolved.is_none() {
            match self.rx.recv_timeout(timeout) {
                Ok(value) => self.resolved = Some(value),
                Err(RecvTimeoutError::Disconnected) => self.resolved = Some(T::abandoned()),
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
        self.resolved.as_ref()
    }

    /// Block until resolved and take the outcome.
    pub fn wait(self) -> T {
        let Self { rx, resolved } = self;
        match resolved {
            Some(value) => value,
            None => rx.recv().unwrap_or_else(|_| T::abandoned()),
        }
    }
}
