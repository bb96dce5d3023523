//! Raw count to calibrated position.
//!
//! `position = raw_count * sign * numerator / denominator + offset`, with
//! truncating division on a 64-bit intermediate. The cached position is
//! recomputed by every mutator before it returns, so a stale value is never
//! observable.

use crate::fixed_point::{saturate_i32, scale_counts};

/// Sign applied to raw counts before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reversed,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Direction::Forward => 1,
            Direction::Reversed => -1,
        }
    }

    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Direction::Forward => Direction::Reversed,
            Direction::Reversed => Direction::Forward,
        }
    }

    #[inline]
    pub fn is_reversed(self) -> bool {
        matches!(self, Direction::Reversed)
    }
}

/// Why a calibration write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    ZeroNumerator,
    ZeroDenominator,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::ZeroNumerator => f.write_str("numerator must be > 0"),
            Rejection::ZeroDenominator => f.write_str("denominator must be > 0"),
        }
    }
}

/// Result of a calibration mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Rejected(Rejection),
}

impl Outcome {
    #[inline]
    pub fn is_applied(self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionModel {
    raw_count: i32,
    numerator: u16,
    denominator: u16,
    direction: Direction,
    /// Kept wide so `set_position(p)` lands exactly on `p` for any count.
    offset: i64,
    position: i32,
}

impl Default for PositionModel {
    fn default() -> Self {
        Self {
            raw_count: 0,
            numerator: 1,
            denominator: 1,
            direction: Direction::Forward,
            offset: 0,
            position: 0,
        }
    }
}

impl PositionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an explicit scale fraction; zero parts fall back to 1.
    pub fn with_scale(numerator: u16, denominator: u16) -> Self {
        let mut m = Self::default();
        let _ = m.set_numerator(numerator);
        let _ = m.set_denominator(denominator);
        m
    }

    /// Store a fresh counter sample and return the new position.
    #[inline]
    pub fn update(&mut self, raw_count: i32) -> i32 {
        self.raw_count = raw_count;
        self.recompute()
    }

    /// Re-anchor so the current position reads `p`. `raw_count` is untouched.
    pub fn set_position(&mut self, p: i32) -> i32 {
        let scaled = self.scaled();
        self.offset = i64::from(p) - scaled;
        self.recompute()
    }

    pub fn set_numerator(&mut self, n: u16) -> Outcome {
        if n == 0 {
            tracing::warn!(current = self.numerator, "rejected numerator 0");
            return Outcome::Rejected(Rejection::ZeroNumerator);
        }
        self.numerator = n;
        self.recompute();
        Outcome::Applied
    }

    pub fn set_denominator(&mut self, d: u16) -> Outcome {
        if d == 0 {
            tracing::warn!(current = self.denominator, "rejected denominator 0");
            return Outcome::Rejected(Rejection::ZeroDenominator);
        }
        self.denominator = d;
        self.recompute();
        Outcome::Applied
    }

    pub fn toggle_direction(&mut self) -> Direction {
        self.direction = self.direction.toggled();
        self.recompute();
        self.direction
    }

    #[inline]
    pub fn position(&self) -> i32 {
        self.position
    }
    #[inline]
    pub fn numerator(&self) -> u16 {
        self.numerator
    }
    #[inline]
    pub fn denominator(&self) -> u16 {
        self.denominator
    }
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }
    #[inline]
    pub fn offset(&self) -> i64 {
        self.offset
    }
    #[inline]
    pub fn raw_count(&self) -> i32 {
        self.raw_count
    }

    #[inline]
    fn scaled(&self) -> i64 {
        scale_counts(
            self.raw_count,
            self.direction.sign(),
            self.numerator,
            self.denominator,
        )
    }

    #[inline]
    fn recompute(&mut self) -> i32 {
        self.position = saturate_i32(self.scaled() + self.offset);
        self.position
    }
}
