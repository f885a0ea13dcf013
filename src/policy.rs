//! Per-instance resize tunables.

use crate::error::PolicyError;

/// Load-factor thresholds and resize factors of one map instance.
///
/// Thresholds are stored as inverses so all checks stay in integer
/// arithmetic: the index grows once `len * max_load_inverse > capacity` and
/// shrinks once `len * min_load_inverse < capacity`.
///
/// Build custom policies from [`LoadPolicy::DEFAULT`] with struct update
/// syntax and hand them to `ProbeHashMap::try_with_policy`, which validates
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadPolicy {
    /// Index capacity of a fresh or cleared map, and the shrink floor.
    pub start_capacity: usize,
    pub max_load_inverse: usize,
    pub min_load_inverse: usize,
    /// Growth computes `capacity * growth_factor + 1`. At most
    /// [`LoadPolicy::MAX_GROWTH_FACTOR`].
    pub growth_factor: usize,
    /// Shrinking computes `capacity / shrink_factor`, floored at
    /// `start_capacity`.
    pub shrink_factor: usize,
}

impl LoadPolicy {
    /// Largest accepted `growth_factor`. Larger factors overflow the
    /// index allocation within a couple of grows.
    pub const MAX_GROWTH_FACTOR: usize = 64;

    pub const DEFAULT: LoadPolicy = LoadPolicy {
        start_capacity: 5,
        max_load_inverse: 2,
        min_load_inverse: 8,
        growth_factor: 2,
        shrink_factor: 2,
    };

    /// Checks that the policy keeps probing terminating and that a shrink
    /// cannot immediately re-trigger a grow.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_load_inverse < 2 {
            return Err(PolicyError::LoadTooHigh(self.max_load_inverse));
        }
        if self.start_capacity < self.max_load_inverse {
            return Err(PolicyError::CapacityTooSmall {
                start_capacity: self.start_capacity,
                max_load_inverse: self.max_load_inverse,
            });
        }
        if self.growth_factor < 2 {
            return Err(PolicyError::GrowthTooSmall(self.growth_factor));
        }
        if self.growth_factor > Self::MAX_GROWTH_FACTOR {
            return Err(PolicyError::GrowthTooLarge {
                got: self.growth_factor,
                max: Self::MAX_GROWTH_FACTOR,
            });
        }
        if self.shrink_factor < 2 {
            return Err(PolicyError::ShrinkTooSmall(self.shrink_factor));
        }
        let required = self.shrink_factor.saturating_mul(self.max_load_inverse);
        if self.min_load_inverse < required {
            return Err(PolicyError::ThresholdsOverlap {
                min_load_inverse: self.min_load_inverse,
                required,
            });
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn over_loaded(&self, len: usize, capacity: usize) -> bool {
        len.saturating_mul(self.max_load_inverse) > capacity
    }

    #[inline]
    pub(crate) fn under_loaded(&self, len: usize, capacity: usize) -> bool {
        len.saturating_mul(self.min_load_inverse) < capacity
    }

    pub(crate) fn grown(&self, capacity: usize) -> usize {
        capacity.saturating_mul(self.growth_factor).saturating_add(1)
    }

    pub(crate) fn shrunk(&self, capacity: usize) -> usize {
        (capacity / self.shrink_factor).max(self.start_capacity)
    }
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}
