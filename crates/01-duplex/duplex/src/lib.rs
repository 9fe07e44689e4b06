//! Single-writer, single-reader transform stream.
//!
//! This crate provides the duplex primitive that stream lifecycle wrappers
//! sit on:
//! * [`Duplex`] – a transform stream split into [`Writable`] and [`Readable`] halves.
//! * [`Writer`] – the exclusive writer with readiness, write, close and abort.
//! * [`Transformer`] / [`TransformController`] – the per-chunk mapping onto the readable side.
//! * [`QueuingStrategy`] – count-based backpressure configuration.
//! * [`StreamError`] / [`AbortError`] – the cloneable error surface handed to every waiter.
//!
//! The crate is executor-agnostic: readiness and reads are plain futures and
//! a [`futures::Stream`], woken through stored wakers.

mod error;
mod pipe;
mod readable;
mod shared;
mod strategy;
mod transform;
mod writer;

pub use error::{AbortError, ErrorCode, StreamError, StreamResult, DEFAULT_ABORT_REASON};
pub use pipe::Duplex;
pub use readable::Readable;
pub use strategy::QueuingStrategy;
pub use transform::{transform_fn, Identity, TransformController, TransformFn, Transformer};
pub use writer::{Writable, Writer};
