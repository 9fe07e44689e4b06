//! Shared harness: a writer spy that records terminal calls and can hold
//! them in flight until released.

#![allow(dead_code)]

use duplex::{Duplex, StreamError, StreamResult, Writer};
use futures::channel::oneshot;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use managed_stream::{ManagedStream, StreamWriter};
use parking_lot::Mutex;

#[derive(Clone, Debug, Default)]
pub struct Calls {
    pub closes: usize,
    pub aborts: Vec<StreamError>,
    pub releases: usize,
}

pub struct SpyWriter<I> {
    pub inner: Writer<I>,
    calls: Mutex<Calls>,
    gate: Option<Shared<oneshot::Receiver<()>>>,
}

impl<I: Send + 'static> SpyWriter<I> {
    pub fn new(inner: Writer<I>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Calls::default()),
            gate: None,
        }
    }

    pub fn gated(inner: Writer<I>) -> (Self, oneshot::Sender<()>) {
        let (open, gate) = oneshot::channel();
        let spy = Self {
            inner,
            calls: Mutex::new(Calls::default()),
            gate: Some(gate.shared()),
        };
        (spy, open)
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().clone()
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            let _ = gate.clone().await;
        }
    }
}

impl<I: Send + 'static> StreamWriter<I> for SpyWriter<I> {
    fn ready(&self) -> BoxFuture<'_, StreamResult<()>> {
        self.inner.ready().boxed()
    }

    fn write(&self, chunk: I) -> BoxFuture<'_, StreamResult<()>> {
        self.inner.write(chunk).boxed()
    }

    fn close(&self) -> BoxFuture<'_, StreamResult<()>> {
        async move {
            self.calls.lock().closes += 1;
            self.pass_gate().await;
            self.inner.close().await
        }
        .boxed()
    }

    fn abort(&self, reason: StreamError) -> BoxFuture<'_, StreamResult<()>> {
        async move {
            self.calls.lock().aborts.push(reason.clone());
            self.pass_gate().await;
            self.inner.abort(reason).await
        }
        .boxed()
    }

    fn release_lock(&self) {
        self.calls.lock().releases += 1;
        self.inner.release_lock();
    }
}

pub type SpiedStream<T> = ManagedStream<T, T, SpyWriter<T>>;

/// Pass-through stream whose writer records every terminal call.
pub fn spied_stream<T: Send + 'static>() -> SpiedStream<T> {
    let Duplex { writable, readable } = Duplex::<T>::identity();
    let writer = writable.get_writer().expect("writer");
    ManagedStream::from_parts(SpyWriter::new(writer), readable)
}

/// Like [`spied_stream`], but close and abort stay in flight until the
/// returned sender fires.
pub fn gated_stream<T: Send + 'static>() -> (SpiedStream<T>, oneshot::Sender<()>) {
    let Duplex { writable, readable } = Duplex::<T>::identity();
    let writer = writable.get_writer().expect("writer");
    let (spy, open) = SpyWriter::gated(writer);
    (ManagedStream::from_parts(spy, readable), open)
}
