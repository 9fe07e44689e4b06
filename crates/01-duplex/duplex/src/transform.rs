//! Transformer trait and the controller handed to it.

use std::collections::VecDeque;
use std::marker::PhantomData;

/// Maps written chunks onto the readable side.
///
/// `transform` runs once per written chunk, in write order, and may enqueue
/// any number of output chunks. `flush` runs once when the writer closes.
/// Returning an error errors the whole stream with
/// [`StreamError::Transform`](crate::StreamError::Transform).
pub trait Transformer<I, O>: Send + 'static {
    fn transform(&mut self, chunk: I, controller: &mut TransformController<O>)
        -> anyhow::Result<()>;

    fn flush(&mut self, _controller: &mut TransformController<O>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Pass-through transformer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<T: Send + 'static> Transformer<T, T> for Identity {
    fn transform(&mut self, chunk: T, controller: &mut TransformController<T>) -> anyhow::Result<()> {
        controller.enqueue(chunk);
        Ok(())
    }
}

/// Transformer built from a closure; see [`transform_fn`].
pub struct TransformFn<F, I, O> {
    f: F,
    _marker: PhantomData<fn(I) -> O>,
}

/// Wraps a closure as a [`Transformer`].
///
/// ```
/// use duplex::{transform_fn, Duplex, QueuingStrategy, TransformController};
/// use futures::executor::block_on;
///
/// let upper = transform_fn(|chunk: String, ctl: &mut TransformController<String>| {
///     ctl.enqueue(chunk.to_uppercase());
///     Ok(())
/// });
/// let Duplex { writable, readable } =
///     Duplex::new(upper, QueuingStrategy::count(4), QueuingStrategy::count(0));
/// let writer = writable.get_writer()?;
///
/// block_on(writer.write("shout".to_owned()))?;
/// block_on(writer.close())?;
/// assert_eq!(block_on(readable.read_all())?, vec!["SHOUT".to_owned()]);
/// # Ok::<(), duplex::StreamError>(())
/// ```
pub fn transform_fn<I, O, F>(f: F) -> TransformFn<F, I, O>
where
    F: FnMut(I, &mut TransformController<O>) -> anyhow::Result<()> + Send + 'static,
{
    TransformFn {
        f,
        _marker: PhantomData,
    }
}

impl<I, O, F> Transformer<I, O> for TransformFn<F, I, O>
where
    F: FnMut(I, &mut TransformController<O>) -> anyhow::Result<()> + Send + 'static,
    I: 'static,
    O: 'static,
{
    fn transform(&mut self, chunk: I, controller: &mut TransformController<O>) -> anyhow::Result<()> {
        (self.f)(chunk, controller)
    }
}

/// Output handle passed to a [`Transformer`].
///
/// Owns the readable-side buffer; chunks enqueued here are what the reader
/// observes.
pub struct TransformController<O> {
    queue: VecDeque<O>,
    capacity: usize,
    terminated: bool,
}

impl<O> TransformController<O> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
            terminated: false,
        }
    }

    /// Appends a chunk to the readable side. Never blocks; the buffer may
    /// grow past its capacity when one input expands into many outputs.
    pub fn enqueue(&mut self, chunk: O) {
        self.queue.push_back(chunk);
    }

    /// Remaining buffer room before backpressure applies. Negative when the
    /// buffer is over capacity.
    pub fn desired_size(&self) -> isize {
        let capacity = isize::try_from(self.capacity).unwrap_or(isize::MAX);
        let len = isize::try_from(self.queue.len()).unwrap_or(isize::MAX);
        capacity.saturating_sub(len)
    }

    /// Closes the readable side once the current call returns. Later writes
    /// fail with [`StreamError::Closed`](crate::StreamError::Closed).
    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn pop(&mut self) -> Option<O> {
        self.queue.pop_front()
    }

    pub(crate) fn discard(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    pub(crate) fn take_terminated(&mut self) -> bool {
        std::mem::take(&mut self.terminated)
    }
}
