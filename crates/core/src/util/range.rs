use crate::error::{SimError, SimResult};
use derive_more::Display;

/// A range between two `f64` values, inclusive on both ends. Used throughout
/// the terrain pipeline to map noise outputs, depth curves, and calibration
/// values between domains without sprinkling ad-hoc arithmetic everywhere.
#[derive(Copy, Clone, Debug, Display, PartialEq)]
#[display(fmt = "[{}, {}]", min, max)]
pub struct NumRange {
    pub min: f64,
    pub max: f64,
}

impl NumRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Get the [0,1] range.
    pub const fn normal_range() -> Self {
        Self::new(0.0, 1.0)
    }

    /// Max minus min
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Create a [RangeValue] in this range, which is convenient for chaining
    /// operations on a single value.
    pub fn value(self, value: f64) -> RangeValue {
        RangeValue { value, range: self }
    }

    /// Check if a value is in this range. Ranges are inclusive on both ends.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Checks if the value is in this range. If it isn't, return an error.
    pub fn ensure_contains(&self, value: f64) -> SimResult<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(SimError::InvalidArgument(format!(
                "value {} is not in range {}",
                value, self
            )))
        }
    }

    /// Map a value from this range to the target range. If the span of this
    /// range is zero we can't properly map the value, so we arbitrarily
    /// return the **minimum** of the target range.
    pub fn map_to(&self, dest_range: &Self, value: f64) -> f64 {
        let span = self.span();
        if span > 0.0 {
            // Map down to [0,1], then map back up to the target range
            let normalized = (value - self.min) / span;
            dest_range.min + (normalized * dest_range.span())
        } else {
            dest_range.min
        }
    }

    /// Map a value from this range to the range [0, 1]
    pub fn normalize(&self, value: f64) -> f64 {
        self.map_to(&Self::normal_range(), value)
    }

    /// Force a value into this range. If it's already in the range, return
    /// that value. If it's outside the range, return the bound (lower or
    /// upper) that's closest to the value.
    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// An alternative interface for [NumRange] that makes it easy to chain
/// operations on a single value.
///
/// ```
/// use tellus::NumRange;
///
/// let range = NumRange::new(10.0, 20.0);
/// let value = range.value(15.0).normalize().apply(|x| x + 1.0).inner();
/// assert_eq!(value, 1.5);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct RangeValue {
    value: f64,
    range: NumRange,
}

impl RangeValue {
    /// Get the value out of this struct
    pub fn inner(self) -> f64 {
        self.value
    }

    /// Map this value to the range [0,1]
    pub fn normalize(self) -> Self {
        self.map_to(NumRange::normal_range())
    }

    /// Map this value from the current range to a new range.
    pub fn map_to(self, range: NumRange) -> Self {
        let new_value = self.range.map_to(&range, self.value);
        Self {
            range,
            value: new_value,
        }
    }

    /// Force the given value into this range. If it falls outside the range,
    /// it will be set to the nearer of the two bounds.
    pub fn clamp(self) -> Self {
        Self {
            value: self.range.clamp(self.value),
            range: self.range,
        }
    }

    /// Apply the given mapping function to this value. The value will be
    /// replaced with the output of the function.
    pub fn apply(self, f: impl FnOnce(f64) -> f64) -> Self {
        Self {
            value: f(self.value),
            range: self.range,
        }
    }
}
