use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::Poll;

use futures::future::poll_fn;
use tracing::debug;

use crate::error::{StreamError, StreamResult};
use crate::shared::WriteSide;

/// Writable half of a duplex. Writing goes through an exclusive [`Writer`].
pub struct Writable<I> {
    shared: Arc<dyn WriteSide<I>>,
}

impl<I> Writable<I> {
    pub(crate) fn new(shared: Arc<dyn WriteSide<I>>) -> Self {
        Self { shared }
    }

    /// Acquires the exclusive writer. Fails with [`StreamError::Locked`]
    /// while another writer holds the lock.
    pub fn get_writer(&self) -> StreamResult<Writer<I>> {
        if !self.shared.lock_writer() {
            return Err(StreamError::Locked);
        }
        debug!("writer acquired");
        Ok(Writer {
            shared: Arc::clone(&self.shared),
            released: AtomicBool::new(false),
        })
    }

    pub fn is_locked(&self) -> bool {
        self.shared.is_locked()
    }
}

/// Exclusive handle for writing to and terminating the writable side.
///
/// Dropping the writer releases its lock.
pub struct Writer<I> {
    shared: Arc<dyn WriteSide<I>>,
    released: AtomicBool,
}

impl<I> Writer<I> {
    fn attached(&self) -> StreamResult<()> {
        if self.released.load(Ordering::Acquire) {
            return Err(self.shared.terminal_error().unwrap_or(StreamError::Released));
        }
        Ok(())
    }

    /// Resolves once the buffer can take another chunk. Rejects with the
    /// termination cause once the stream is closed or errored.
    pub fn ready(&self) -> impl Future<Output = StreamResult<()>> + '_ {
        poll_fn(move |cx| {
            if let Err(err) = self.attached() {
                return Poll::Ready(Err(err));
            }
            self.shared.poll_ready(cx)
        })
    }

    /// Runs the transformer on `chunk` and queues its output. Does not wait
    /// for backpressure; await [`Writer::ready`] first.
    pub async fn write(&self, chunk: I) -> StreamResult<()> {
        self.attached()?;
        self.shared.write(chunk)
    }

    /// Flushes the transformer and signals end-of-stream to the reader.
    pub async fn close(&self) -> StreamResult<()> {
        self.attached()?;
        self.shared.close()
    }

    /// Errors the stream with `reason`. Pending and later writer operations
    /// reject with it and buffered output is discarded. A no-op on a stream
    /// that already terminated.
    pub async fn abort(&self, reason: StreamError) -> StreamResult<()> {
        self.attached()?;
        self.shared.abort(reason);
        Ok(())
    }

    /// Detaches this writer from the writable side. Idempotent.
    pub fn release_lock(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.shared.unlock_writer();
            debug!("writer lock released");
        }
    }

    /// Remaining buffer room. `None` once the stream errored, zero once
    /// closed.
    pub fn desired_size(&self) -> Option<isize> {
        self.shared.desired_size()
    }
}

impl<I> Drop for Writer<I> {
    fn drop(&mut self) {
        self.release_lock();
    }
}
