//! Axis identifiers, direction and per-axis bit masks.

/// Number of logical axes driven by the core.
pub const NUM_AXES: usize = 4;

/// Logical axis.
///
/// `X` and `Y` usually steer the beam, `Z` is a pulse axis with a limit
/// switch and `E` is the secondary axis that may be paced independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// First beam axis.
    X,
    /// Second beam axis.
    Y,
    /// Build axis.
    Z,
    /// Secondary (feed) axis.
    E,
}

impl Axis {
    /// All axes in array order.
    pub const ALL: [Axis; NUM_AXES] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    /// Index into per-axis arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short name used in reports and configuration keys.
    pub const fn name(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::E => "E",
        }
    }

    #[inline]
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Direction of travel along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Increasing position.
    Positive,
    /// Decreasing position.
    Negative,
}

impl Direction {
    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }
}

/// One bit per axis.
///
/// Used both as the block direction field (bit set means the axis moves in
/// the negative direction) and as a set of axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMask(pub u8);

impl AxisMask {
    /// No axes.
    pub const EMPTY: Self = Self(0);

    /// Whether the axis bit is set.
    #[inline]
    pub const fn contains(self, axis: Axis) -> bool {
        self.0 & axis.bit() != 0
    }

    /// Return a copy with the axis bit set or cleared.
    #[inline]
    pub const fn with(self, axis: Axis, set: bool) -> Self {
        if set {
            Self(self.0 | axis.bit())
        } else {
            Self(self.0 & !axis.bit())
        }
    }

    /// Whether any axis is in both masks.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether no bit is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Interpret the mask as a direction field.
    #[inline]
    pub const fn direction(self, axis: Axis) -> Direction {
        if self.contains(axis) {
            Direction::Negative
        } else {
            Direction::Positive
        }
    }

    /// Axes whose bit is set, in array order.
    pub fn iter(self) -> impl Iterator<Item = Axis> {
        Axis::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_direction() {
        let dirs = AxisMask::EMPTY.with(Axis::Y, true).with(Axis::E, true);
        assert_eq!(dirs.direction(Axis::X), Direction::Positive);
        assert_eq!(dirs.direction(Axis::Y), Direction::Negative);
        assert_eq!(dirs.direction(Axis::E), Direction::Negative);
        assert_eq!(dirs.iter().count(), 2);
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Negative.sign(), -1);
        assert_eq!(Direction::Positive.sign(), 1);
    }
}
