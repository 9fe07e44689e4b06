//! Tri-state lifecycle flag shared by `close` and `abort`.
//!
//! The Open→Closing check-and-set is a single compare-exchange, so exactly
//! one terminal call wins no matter how calls interleave across tasks or
//! threads. The winner holds a [`Transition`]: finishing it moves the state
//! to `Closed`, dropping it unfinished hands the stream back as `Open` so a
//! later terminal call can run the side effect. `Closing` is never left
//! behind.

#[cfg(feature = "loom")]
use loom::sync::atomic::{AtomicU8, Ordering};
#[cfg(not(feature = "loom"))]
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::trace;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Writes accepted; no terminal call has started.
    Open = 0,
    /// A terminal call won the transition and is in flight.
    Closing = 1,
    /// Terminal. No transition leaves this state.
    Closed = 2,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Open,
            1 => LifecycleState::Closing,
            _ => LifecycleState::Closed,
        }
    }
}

pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Open as u8),
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Claims the terminal transition. Returns `None` when another call
    /// already claimed it or the lifecycle is closed.
    pub(crate) fn begin(&self) -> Option<Transition<'_>> {
        self.state
            .compare_exchange(
                LifecycleState::Open as u8,
                LifecycleState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| Transition {
                lifecycle: self,
                finished: false,
            })
    }
}

/// Exclusive right to perform the terminal side effect.
pub(crate) struct Transition<'a> {
    lifecycle: &'a Lifecycle,
    finished: bool,
}

impl Transition<'_> {
    pub(crate) fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        let next = if self.finished {
            LifecycleState::Closed
        } else {
            trace!("terminal call dropped mid-flight; reopening");
            LifecycleState::Open
        };
        self.lifecycle.state.store(next as u8, Ordering::Release);
    }
}
