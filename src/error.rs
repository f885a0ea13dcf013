//! Error types returned by `ProbeHashMap`.

use thiserror::Error;

/// Returned by the non-inserting accessors (`at`, `at_mut`) when the key is
/// absent. Every other lookup path reports absence with `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("key not found in map")]
pub struct KeyNotFound;

/// A `LoadPolicy` rejected by the `try_with_policy*` constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The index must always keep a free slot, so the load factor may not
    /// exceed one half.
    #[error("max_load_inverse must be at least 2, got {0}")]
    LoadTooHigh(usize),
    #[error("start_capacity {start_capacity} is below max_load_inverse {max_load_inverse}")]
    CapacityTooSmall {
        start_capacity: usize,
        max_load_inverse: usize,
    },
    #[error("growth_factor must be at least 2, got {0}")]
    GrowthTooSmall(usize),
    #[error("growth_factor must be at most {max}, got {got}")]
    GrowthTooLarge { got: usize, max: usize },
    #[error("shrink_factor must be at least 2, got {0}")]
    ShrinkTooSmall(usize),
    /// A shrink must never land the index above the grow threshold.
    #[error(
        "min_load_inverse {min_load_inverse} must be at least \
         shrink_factor * max_load_inverse ({required})"
    )]
    ThresholdsOverlap {
        min_load_inverse: usize,
        required: usize,
    },
}
