//! Common types for nonoto
//!
//! Musical time is kept exact: a [`Fraction`] counts whole notes, so a quarter
//! note is `1/4`. Pixel geometry uses plain `f32` rectangles so that the core
//! crate stays independent of the UI toolkit.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// Exact rational time value, measured in whole notes
///
/// Always stored normalised (positive denominator, reduced by the gcd), so
/// derived equality and hashing are structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

impl Fraction {
    pub const ZERO: Fraction = Fraction { numerator: 0, denominator: 1 };

    /// Create a new fraction. A zero denominator is treated as 1.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        let (mut n, mut d) = if denominator == 0 { (numerator, 1) } else { (numerator, denominator) };
        if d < 0 {
            n = -n;
            d = -d;
        }
        let g = gcd(n.abs(), d).max(1);
        Self {
            numerator: n / g,
            denominator: d / g,
        }
    }

    /// Duration of `quarters` quarter notes
    pub fn from_quarters(quarters: u32) -> Self {
        Self::new(quarters as i64, 4)
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    /// Floating-point value in whole notes
    pub fn real_value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Integer part (floor) in whole notes
    pub fn whole_value(&self) -> i64 {
        self.numerator.div_euclid(self.denominator)
    }

    /// True when the value is an integer number of whole notes
    pub fn is_whole(&self) -> bool {
        self.denominator == 1
    }

    /// Value expressed in quarter notes
    pub fn quarters(&self) -> f64 {
        self.real_value() * 4.0
    }
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Fraction {
    type Output = Fraction;

    fn add(self, rhs: Self) -> Self {
        Fraction::new(
            self.numerator * rhs.denominator + rhs.numerator * self.denominator,
            self.denominator * rhs.denominator,
        )
    }
}

impl AddAssign for Fraction {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Fraction {
    type Output = Fraction;

    fn sub(self, rhs: Self) -> Self {
        Fraction::new(
            self.numerator * rhs.denominator - rhs.numerator * self.denominator,
            self.denominator * rhs.denominator,
        )
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.numerator as i128 * other.denominator as i128)
            .cmp(&(other.numerator as i128 * self.denominator as i128))
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Pixel size
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_normalises() {
        let f = Fraction::new(2, 8);
        assert_eq!(f, Fraction::new(1, 4));
        assert_eq!(Fraction::new(1, -2), Fraction::new(-1, 2));
    }

    #[test]
    fn test_fraction_arithmetic_and_order() {
        let half = Fraction::new(1, 2);
        let quarter = Fraction::from_quarters(1);
        assert_eq!(half + quarter, Fraction::new(3, 4));
        assert_eq!(half - quarter, quarter);
        assert!(quarter < half);
        assert!(half + half <= Fraction::new(1, 1));
    }

    #[test]
    fn test_whole_value_floors() {
        assert_eq!(Fraction::new(3, 2).whole_value(), 1);
        assert_eq!(Fraction::from_quarters(8).whole_value(), 2);
        assert!(Fraction::from_quarters(8).is_whole());
        assert!(!Fraction::from_quarters(6).is_whole());
        assert_eq!(Fraction::from_quarters(6).quarters(), 6.0);
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert!(r.contains(10.0, 14.9));
        assert!(!r.contains(15.0, 12.0));
    }
}
