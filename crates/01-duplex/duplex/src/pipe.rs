use std::sync::Arc;

use tracing::trace;

use crate::readable::Readable;
use crate::shared::Shared;
use crate::strategy::{combined_capacity, QueuingStrategy};
use crate::transform::{Identity, Transformer};
use crate::writer::Writable;

/// A transform stream split into its writable and readable halves.
pub struct Duplex<I, O = I> {
    pub writable: Writable<I>,
    pub readable: Readable<O>,
}

impl<I, O> Duplex<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new<T>(transformer: T, writable: QueuingStrategy, readable: QueuingStrategy) -> Self
    where
        T: Transformer<I, O>,
    {
        Self::from_boxed(Box::new(transformer), writable, readable)
    }

    pub fn from_boxed(
        transformer: Box<dyn Transformer<I, O>>,
        writable: QueuingStrategy,
        readable: QueuingStrategy,
    ) -> Self {
        let capacity = combined_capacity(writable, readable);
        trace!(capacity, "duplex created");
        let shared = Arc::new(Shared::new(transformer, capacity));
        Self {
            writable: Writable::new(shared.clone()),
            readable: Readable::new(shared),
        }
    }

    pub fn into_parts(self) -> (Writable<I>, Readable<O>) {
        (self.writable, self.readable)
    }
}

impl<T> Duplex<T>
where
    T: Send + 'static,
{
    /// Pass-through duplex with default strategies.
    pub fn identity() -> Self {
        Self::new(
            Identity,
            QueuingStrategy::writable_default(),
            QueuingStrategy::readable_default(),
        )
    }
}
