use std::marker::PhantomData;

use duplex::{
    AbortError, Duplex, ErrorCode, Identity, QueuingStrategy, Readable, StreamResult,
    Transformer, Writer, DEFAULT_ABORT_REASON,
};
use http::HeaderMap;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::config::StreamConfig;
use crate::headers::stream_headers;
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::writer::StreamWriter;

/// Overrides applied to the [`AbortError`] built by
/// [`ManagedStream::abort_with`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AbortOptions {
    pub code: ErrorCode,
    pub cause: Option<String>,
}

impl AbortOptions {
    pub fn code(code: ErrorCode) -> Self {
        Self { code, cause: None }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    fn into_error(self, reason: String) -> AbortError {
        let err = AbortError::new(reason).with_code(self.code);
        match self.cause {
            Some(cause) => err.with_cause(cause),
            None => err,
        }
    }
}

/// Owner-controlled duplex stream with idempotent `close` and `abort`.
///
/// The producer pushes chunks through [`write`](Self::write); the consumer
/// reads the transformed sequence from [`take_readable`](Self::take_readable).
/// Exactly one of `close` or `abort` performs its side effect per instance,
/// whichever claims the lifecycle first. Every other terminal call, racing or
/// later, resolves immediately with the instance.
///
/// All operations take `&self` and return the instance on success, so calls
/// chain: `stream.write(a).await?.write(b).await?.close().await?`.
pub struct ManagedStream<I, O = I, W = Writer<I>> {
    writer: W,
    readable: Mutex<Option<Readable<O>>>,
    lifecycle: Lifecycle,
    headers: HeaderMap,
    _input: PhantomData<fn(I)>,
}

impl<T> ManagedStream<T>
where
    T: Send + 'static,
{
    /// Pass-through stream with default queuing strategies.
    pub fn new() -> StreamResult<Self> {
        Self::with_transformer(Identity)
    }
}

impl<I, O> ManagedStream<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn with_transformer<T>(transformer: T) -> StreamResult<Self>
    where
        T: Transformer<I, O>,
    {
        Self::with_config(transformer, &StreamConfig::default())
    }

    pub fn with_config<T>(transformer: T, config: &StreamConfig) -> StreamResult<Self>
    where
        T: Transformer<I, O>,
    {
        Self::with_strategies(transformer, config.writable, config.readable)
    }

    pub fn with_strategies<T>(
        transformer: T,
        writable: QueuingStrategy,
        readable: QueuingStrategy,
    ) -> StreamResult<Self>
    where
        T: Transformer<I, O>,
    {
        let (writable, readable) = Duplex::new(transformer, writable, readable).into_parts();
        let writer = writable.get_writer()?;
        Ok(Self::from_parts(writer, readable))
    }
}

impl<I, O, W> ManagedStream<I, O, W>
where
    I: Send + 'static,
    W: StreamWriter<I>,
{
    /// Wraps an already acquired writer and the readable side it feeds.
    pub fn from_parts(writer: W, readable: Readable<O>) -> Self {
        Self {
            writer,
            readable: Mutex::new(Some(readable)),
            lifecycle: Lifecycle::new(),
            headers: stream_headers(),
            _input: PhantomData,
        }
    }

    /// Waits for the writer to be ready, then submits `chunk`.
    ///
    /// Fails with the abort cause once the stream was aborted, with
    /// [`StreamError::Closed`](duplex::StreamError::Closed) once closed, and
    /// with the transformer's error if it rejects the chunk.
    pub async fn write(&self, chunk: I) -> StreamResult<&Self> {
        self.writer.ready().await?;
        self.writer.write(chunk).await?;
        Ok(self)
    }

    /// Closes the writer and releases its lock.
    ///
    /// Only the first terminal call does anything; the rest return the
    /// instance untouched. The instance is `Closed` afterwards even when the
    /// underlying close fails, in which case the failure is returned.
    /// Dropping the future before the underlying close completes leaves the
    /// instance `Open`, so a later `close` or `abort` can still terminate it.
    pub async fn close(&self) -> StreamResult<&Self> {
        let Some(transition) = self.lifecycle.begin() else {
            trace!(state = ?self.state(), "close ignored; stream already terminating");
            return Ok(self);
        };

        debug!("closing stream");
        let result = self.writer.close().await;
        self.writer.release_lock();
        transition.finish();

        match result {
            Ok(()) => {
                debug!("stream closed");
                Ok(self)
            }
            Err(err) => {
                warn!("underlying close failed: {err}");
                Err(err)
            }
        }
    }

    /// Aborts with the default reason and [`ErrorCode::Abort`].
    pub async fn abort(&self) -> StreamResult<&Self> {
        self.abort_with(DEFAULT_ABORT_REASON, AbortOptions::default())
            .await
    }

    /// Aborts the writer with an [`AbortError`] built from `reason` and
    /// `options`. Pending and later writes reject with that error.
    ///
    /// Same single-winner rule as [`close`](Self::close): a call that loses
    /// the race has its reason dropped.
    pub async fn abort_with(
        &self,
        reason: impl Into<String>,
        options: AbortOptions,
    ) -> StreamResult<&Self> {
        let Some(transition) = self.lifecycle.begin() else {
            trace!(state = ?self.state(), "abort ignored; stream already terminating");
            return Ok(self);
        };

        let cause = options.into_error(reason.into());
        debug!(code = %cause.code(), "aborting stream: {cause}");
        let result = self.writer.abort(cause.into()).await;
        transition.finish();

        if let Err(err) = &result {
            warn!("underlying abort failed: {err}");
        }
        result.map(|()| self)
    }

    /// True once a terminal call has completed.
    pub fn closed(&self) -> bool {
        self.lifecycle.state() == LifecycleState::Closed
    }

    /// True while a terminal call is in flight.
    pub fn is_closing(&self) -> bool {
        self.lifecycle.state() == LifecycleState::Closing
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Response headers for embedding the readable side in a chunked HTTP
    /// response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Hands out the readable side. Reading is single-pass, so this returns
    /// `Some` exactly once.
    pub fn take_readable(&self) -> Option<Readable<O>> {
        self.readable.lock().take()
    }
}
