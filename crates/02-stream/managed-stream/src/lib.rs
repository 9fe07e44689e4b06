//! Managed duplex stream with exactly-once termination.
//!
//! [`ManagedStream`] owns one exclusive writer over a [`duplex::Duplex`] and a
//! tri-state lifecycle (`Open` → `Closing` → `Closed`). `close` and `abort`
//! may be called any number of times, concurrently or without awaiting; the
//! first to claim the lifecycle performs the underlying side effect and every
//! other call is a no-op that returns the instance.
//!
//! The readable side is handed to the consumer verbatim, and [`headers`]
//! carries the fixed response headers for streaming it over chunked HTTP.

mod config;
pub mod headers;
mod lifecycle;
mod stream;
mod writer;

pub use config::StreamConfig;
pub use lifecycle::LifecycleState;
pub use stream::{AbortOptions, ManagedStream};
pub use writer::StreamWriter;

pub use duplex::{
    transform_fn, AbortError, ErrorCode, Identity, QueuingStrategy, Readable, StreamError,
    StreamResult, TransformController, Transformer, Writer, DEFAULT_ABORT_REASON,
};
