use serde::Deserialize;

/// Count-based queuing strategy: each chunk counts as one unit.
///
/// The writable and readable strategies of a duplex are summed into one
/// buffer capacity. A total of zero makes the stream pull-driven: the writer
/// only becomes ready while the reader is parked on an empty buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct QueuingStrategy {
    pub high_water_mark: usize,
}

impl QueuingStrategy {
    pub const fn count(high_water_mark: usize) -> Self {
        Self { high_water_mark }
    }

    /// Default strategy for the writable side.
    pub const fn writable_default() -> Self {
        Self::count(1)
    }

    /// Default strategy for the readable side.
    pub const fn readable_default() -> Self {
        Self::count(0)
    }
}

pub(crate) fn combined_capacity(writable: QueuingStrategy, readable: QueuingStrategy) -> usize {
    writable
        .high_water_mark
        .saturating_add(readable.high_water_mark)
}
