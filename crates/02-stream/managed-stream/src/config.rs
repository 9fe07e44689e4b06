use duplex::QueuingStrategy;
use serde::Deserialize;

/// Queuing configuration for a [`ManagedStream`](crate::ManagedStream).
///
/// Missing fields fall back to the defaults: a writable high-water mark of
/// one chunk and a readable high-water mark of zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub writable: QueuingStrategy,
    pub readable: QueuingStrategy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            writable: QueuingStrategy::writable_default(),
            readable: QueuingStrategy::readable_default(),
        }
    }
}
