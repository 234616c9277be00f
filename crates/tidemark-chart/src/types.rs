//! Identifiers and range types shared by state, gestures and rendering.

fn fnv1a(name: &str) -> u32 {
    const FNV_OFFSET_BASIS: u32 = 2166136261;
    const FNV_PRIME: u32 = 16777619;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in name.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Identifies one chart in [`crate::ChartsState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartId(pub u32);

impl ChartId {
    /// Stable id from a name. The same name always yields the same id.
    pub fn from_name(name: &str) -> Self {
        Self(fnv1a(name))
    }
}

/// Key under which a viewport half and its selection are stored.
///
/// Charts that use the same key share that axis: a primary chart and its
/// overview can share the value axis while keeping separate time axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxisKey(pub u32);

impl AxisKey {
    pub fn from_name(name: &str) -> Self {
        Self(fnv1a(name))
    }

    /// The key a chart uses for both axes when none is given.
    pub fn for_chart(chart: ChartId) -> Self {
        Self(chart.0)
    }
}

/// A span of time, `min_time < max_time` once normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub min_time: f64,
    pub max_time: f64,
}

/// A span of sample values, `min_value < max_value` once normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min_value: f64,
    pub max_value: f64,
}

/// Half-width added on each side of a zero-width range.
pub const DEGENERATE_PADDING: f64 = 0.5;

macro_rules! range_impl {
    ($ty:ident, $min:ident, $max:ident) => {
        impl $ty {
            pub const fn new($min: f64, $max: f64) -> Self {
                Self { $min, $max }
            }

            /// Range covering both ends, in whichever order they arrive.
            pub fn spanning(a: f64, b: f64) -> Self {
                Self::new(a.min(b), a.max(b))
            }

            pub fn span(&self) -> f64 {
                self.$max - self.$min
            }

            pub fn mid(&self) -> f64 {
                (self.$max + self.$min) / 2.0
            }

            /// Both ends finite and strictly ordered.
            pub fn is_valid(&self) -> bool {
                self.$min.is_finite() && self.$max.is_finite() && self.$min < self.$max
            }

            pub fn contains(&self, value: f64) -> bool {
                value >= self.$min && value <= self.$max
            }

            /// Scale about the midpoint. `factor < 1` zooms in.
            pub fn zoom(&self, factor: f64) -> Self {
                let mid = self.mid();
                let half = self.$max - mid;
                Self::new(mid - half * factor, mid + half * factor)
            }

            pub fn pan(&self, delta: f64) -> Self {
                Self::new(self.$min + delta, self.$max + delta)
            }

            pub fn union(&self, other: &Self) -> Self {
                Self::new(self.$min.min(other.$min), self.$max.max(other.$max))
            }

            /// Widen a zero-width range by [`DEGENERATE_PADDING`] on each side.
            pub fn padded_if_degenerate(self) -> Self {
                if self.$min == self.$max {
                    Self::new(self.$min - DEGENERATE_PADDING, self.$max + DEGENERATE_PADDING)
                } else {
                    self
                }
            }

            /// Fraction of the way from min to max.
            pub fn normalize(&self, value: f64) -> f64 {
                (value - self.$min) / self.span()
            }

            pub fn lerp(&self, t: f64) -> f64 {
                self.$min + t * self.span()
            }
        }
    };
}

range_impl!(TimeRange, min_time, max_time);
range_impl!(ValueRange, min_value, max_value);

/// A position in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub time: f64,
    pub value: f64,
}

impl DataPoint {
    pub const fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// The visible window of a chart: a time half and a value half.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min_time: f64,
    pub max_time: f64,
    pub min_value: f64,
    pub max_value: f64,
}

impl Viewport {
    pub fn from_ranges(time: TimeRange, value: ValueRange) -> Self {
        Self {
            min_time: time.min_time,
            max_time: time.max_time,
            min_value: value.min_value,
            max_value: value.max_value,
        }
    }

    pub fn time(&self) -> TimeRange {
        TimeRange::new(self.min_time, self.max_time)
    }

    pub fn value(&self) -> ValueRange {
        ValueRange::new(self.min_value, self.max_value)
    }

    /// Map a pointer position, as fractions of the plot area with `y` up,
    /// to the data point under it.
    pub fn point_at_normalized(&self, x: f64, y: f64) -> DataPoint {
        DataPoint::new(self.time().lerp(x), self.value().lerp(y))
    }
}

/// An in-progress brush on one or both axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Selection {
    pub time: Option<TimeRange>,
    pub value: Option<ValueRange>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.time.is_none() && self.value.is_none()
    }

    /// The rectangle to draw for this selection, as fractions of the plot
    /// area with a top-left origin. An axis without a selection spans the
    /// full plot. Fractions are clamped to `0.0..=1.0`.
    pub fn overlay_rect(&self, viewport: &Viewport) -> Option<NormalizedRect> {
        if self.is_empty() {
            return None;
        }

        let (left, right) = match self.time {
            Some(range) => (
                viewport.time().normalize(range.min_time),
                viewport.time().normalize(range.max_time),
            ),
            None => (0.0, 1.0),
        };
        let (bottom, top) = match self.value {
            Some(range) => (
                viewport.value().normalize(range.min_value),
                viewport.value().normalize(range.max_value),
            ),
            None => (0.0, 1.0),
        };

        let left = left.clamp(0.0, 1.0);
        let right = right.clamp(0.0, 1.0);
        let top = (1.0 - top).clamp(0.0, 1.0);
        let bottom = (1.0 - bottom).clamp(0.0, 1.0);

        Some(NormalizedRect {
            left,
            top,
            width: (right - left).max(0.0),
            height: (bottom - top).max(0.0),
        })
    }
}

/// A rectangle in plot fractions, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}
