//! State shared between the writable and readable halves.
//!
//! A single mutex guards the transformer, the output buffer and the stream
//! state, so a write observes and mutates all three atomically. Wakers are
//! collected under the lock and woken after it is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::error::{StreamError, StreamResult};
use crate::transform::{TransformController, Transformer};

#[derive(Debug)]
enum State {
    Writable,
    Closed,
    Errored(StreamError),
}

#[derive(Default)]
struct Wakeups(SmallVec<[Waker; 4]>);

impl Wakeups {
    fn push(&mut self, waker: Option<Waker>) {
        if let Some(waker) = waker {
            self.0.push(waker);
        }
    }

    fn extend(&mut self, wakers: &mut SmallVec<[Waker; 4]>) {
        self.0.extend(wakers.drain(..));
    }

    fn wake(self) {
        for waker in self.0 {
            waker.wake();
        }
    }
}

struct Core<I, O> {
    transformer: Box<dyn Transformer<I, O>>,
    controller: TransformController<O>,
    state: State,
    error_delivered: bool,
    ready_wakers: SmallVec<[Waker; 4]>,
    read_waker: Option<Waker>,
}

impl<I, O> Core<I, O> {
    fn terminal_error(&self) -> Option<StreamError> {
        match &self.state {
            State::Writable => None,
            State::Closed => Some(StreamError::Closed),
            State::Errored(err) => Some(err.clone()),
        }
    }

    fn has_room(&self) -> bool {
        self.controller.len() < self.controller.capacity()
            || (self.controller.is_empty() && self.read_waker.is_some())
    }

    fn register_ready(&mut self, waker: &Waker) {
        if !self.ready_wakers.iter().any(|w| w.will_wake(waker)) {
            self.ready_wakers.push(waker.clone());
        }
    }

    fn wake_everyone(&mut self, wakeups: &mut Wakeups) {
        wakeups.extend(&mut self.ready_wakers);
        wakeups.push(self.read_waker.take());
    }

    fn error(&mut self, err: StreamError, wakeups: &mut Wakeups) {
        let dropped = self.controller.discard();
        debug!(dropped, "duplex errored: {err}");
        self.state = State::Errored(err);
        self.wake_everyone(wakeups);
    }

    fn finish(&mut self, wakeups: &mut Wakeups) {
        self.state = State::Closed;
        self.wake_everyone(wakeups);
    }
}

/// Writer-facing view of the shared state, erased over the output type.
pub(crate) trait WriteSide<I>: Send + Sync {
    fn lock_writer(&self) -> bool;
    fn unlock_writer(&self);
    fn is_locked(&self) -> bool;
    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<StreamResult<()>>;
    fn write(&self, chunk: I) -> StreamResult<()>;
    fn close(&self) -> StreamResult<()>;
    fn abort(&self, reason: StreamError);
    fn terminal_error(&self) -> Option<StreamError>;
    fn desired_size(&self) -> Option<isize>;
}

/// Reader-facing view of the shared state, erased over the input type.
pub(crate) trait ReadSide<O>: Send + Sync {
    fn poll_next(&self, cx: &mut Context<'_>) -> Poll<Option<StreamResult<O>>>;
    fn cancel(&self);
}

pub(crate) struct Shared<I, O> {
    core: Mutex<Core<I, O>>,
    locked: AtomicBool,
}

impl<I, O> Shared<I, O> {
    pub(crate) fn new(transformer: Box<dyn Transformer<I, O>>, capacity: usize) -> Self {
        Self {
            core: Mutex::new(Core {
                transformer,
                controller: TransformController::new(capacity),
                state: State::Writable,
                error_delivered: false,
                ready_wakers: SmallVec::new(),
                read_waker: None,
            }),
            locked: AtomicBool::new(false),
        }
    }
}

impl<I, O> WriteSide<I> for Shared<I, O>
where
    I: 'static,
    O: Send + 'static,
{
    fn lock_writer(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn unlock_writer(&self) {
        self.locked.store(false, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<StreamResult<()>> {
        let mut core = self.core.lock();
        if let Some(err) = core.terminal_error() {
            return Poll::Ready(Err(err));
        }
        if core.has_room() {
            return Poll::Ready(Ok(()));
        }
        core.register_ready(cx.waker());
        Poll::Pending
    }

    fn write(&self, chunk: I) -> StreamResult<()> {
        let mut wakeups = Wakeups::default();
        let result = {
            let mut guard = self.core.lock();
            let core = &mut *guard;
            if let Some(err) = core.terminal_error() {
                return Err(err);
            }
            match core.transformer.transform(chunk, &mut core.controller) {
                Ok(()) => {
                    if core.controller.take_terminated() {
                        trace!("transformer terminated the stream");
                        core.finish(&mut wakeups);
                    } else {
                        wakeups.push(core.read_waker.take());
                    }
                    Ok(())
                }
                Err(source) => {
                    warn!("transform failed: {source:#}");
                    let err = StreamError::transform(source);
                    core.error(err.clone(), &mut wakeups);
                    Err(err)
                }
            }
        };
        wakeups.wake();
        result
    }

    fn close(&self) -> StreamResult<()> {
        let mut wakeups = Wakeups::default();
        let result = {
            let mut guard = self.core.lock();
            let core = &mut *guard;
            if let Some(err) = core.terminal_error() {
                return Err(err);
            }
            match core.transformer.flush(&mut core.controller) {
                Ok(()) => {
                    core.controller.take_terminated();
                    debug!(buffered = core.controller.len(), "duplex closed");
                    core.finish(&mut wakeups);
                    Ok(())
                }
                Err(source) => {
                    warn!("flush failed: {source:#}");
                    let err = StreamError::transform(source);
                    core.error(err.clone(), &mut wakeups);
                    Err(err)
                }
            }
        };
        wakeups.wake();
        result
    }

    fn abort(&self, reason: StreamError) {
        let mut wakeups = Wakeups::default();
        {
            let mut core = self.core.lock();
            if !matches!(core.state, State::Writable) {
                trace!("abort ignored; duplex already terminated");
                return;
            }
            core.error(reason, &mut wakeups);
        }
        wakeups.wake();
    }

    fn terminal_error(&self) -> Option<StreamError> {
        self.core.lock().terminal_error()
    }

    fn desired_size(&self) -> Option<isize> {
        let core = self.core.lock();
        match core.state {
            State::Writable => Some(core.controller.desired_size()),
            State::Closed => Some(0),
            State::Errored(_) => None,
        }
    }
}

impl<I, O> ReadSide<O> for Shared<I, O>
where
    I: 'static,
    O: Send + 'static,
{
    fn poll_next(&self, cx: &mut Context<'_>) -> Poll<Option<StreamResult<O>>> {
        let mut wakeups = Wakeups::default();
        let polled = {
            let mut guard = self.core.lock();
            let core = &mut *guard;
            if let Some(chunk) = core.controller.pop() {
                core.read_waker = None;
                wakeups.extend(&mut core.ready_wakers);
                Poll::Ready(Some(Ok(chunk)))
            } else {
                match &core.state {
                    State::Writable => {
                        let newly_parked = core.read_waker.is_none();
                        core.read_waker = Some(cx.waker().clone());
                        if newly_parked {
                            // An empty buffer with a parked reader counts as room.
                            wakeups.extend(&mut core.ready_wakers);
                        }
                        Poll::Pending
                    }
                    State::Closed => Poll::Ready(None),
                    State::Errored(err) => {
                        if core.error_delivered {
                            Poll::Ready(None)
                        } else {
                            let err = err.clone();
                            core.error_delivered = true;
                            Poll::Ready(Some(Err(err)))
                        }
                    }
                }
            }
        };
        wakeups.wake();
        polled
    }

    fn cancel(&self) {
        let mut wakeups = Wakeups::default();
        {
            let mut core = self.core.lock();
            core.read_waker = None;
            core.error_delivered = true;
            if matches!(core.state, State::Writable) {
                debug!("readable side canceled");
                core.error(StreamError::Canceled, &mut wakeups);
            }
        }
        wakeups.wake();
    }
}
