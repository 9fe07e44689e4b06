//! Writer seam between [`ManagedStream`](crate::ManagedStream) and the duplex.

use duplex::{StreamError, StreamResult, Writer};
use futures::future::BoxFuture;
use futures::FutureExt;

/// The exclusive writer operations a managed stream relies on.
///
/// Implemented for [`duplex::Writer`]; wrappers can implement it to observe
/// or gate the underlying calls.
pub trait StreamWriter<I>: Send + Sync {
    /// Resolves when backpressure clears; rejects with the termination cause.
    fn ready(&self) -> BoxFuture<'_, StreamResult<()>>;

    fn write(&self, chunk: I) -> BoxFuture<'_, StreamResult<()>>;

    fn close(&self) -> BoxFuture<'_, StreamResult<()>>;

    fn abort(&self, reason: StreamError) -> BoxFuture<'_, StreamResult<()>>;

    fn release_lock(&self);
}

impl<I> StreamWriter<I> for Writer<I>
where
    I: Send + 'static,
{
    fn ready(&self) -> BoxFuture<'_, StreamResult<()>> {
        Writer::ready(self).boxed()
    }

    fn write(&self, chunk: I) -> BoxFuture<'_, StreamResult<()>> {
        Writer::write(self, chunk).boxed()
    }

    fn close(&self) -> BoxFuture<'_, StreamResult<()>> {
        Writer::close(self).boxed()
    }

    fn abort(&self, reason: StreamError) -> BoxFuture<'_, StreamResult<()>> {
        Writer::abort(self, reason).boxed()
    }

    fn release_lock(&self) {
        Writer::release_lock(self)
    }
}
