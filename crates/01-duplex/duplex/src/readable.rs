use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, TryStreamExt};

use crate::error::StreamResult;
use crate::shared::ReadSide;

/// Readable half of a duplex: the transformed output, read once, in order.
///
/// Yields `Ok(chunk)` for every queued output, then ends when the writer
/// closes. After an abort or transform failure it yields the cause once and
/// ends. Dropping the readable cancels the stream.
pub struct Readable<O> {
    shared: Arc<dyn ReadSide<O>>,
    canceled: bool,
}

impl<O> Readable<O> {
    pub(crate) fn new(shared: Arc<dyn ReadSide<O>>) -> Self {
        Self {
            shared,
            canceled: false,
        }
    }

    /// Drains the stream to completion.
    pub async fn read_all(self) -> StreamResult<Vec<O>> {
        self.try_collect().await
    }

    /// Stops reading. The writable side errors with
    /// [`StreamError::Canceled`](crate::StreamError::Canceled) unless it
    /// already terminated.
    pub fn cancel(mut self) {
        self.cancel_inner();
    }

    fn cancel_inner(&mut self) {
        if !self.canceled {
            self.canceled = true;
            self.shared.cancel();
        }
    }
}

impl<O> Stream for Readable<O> {
    type Item = StreamResult<O>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.shared.poll_next(cx)
    }
}

impl<O> Drop for Readable<O> {
    fn drop(&mut self) {
        self.cancel_inner();
    }
}
