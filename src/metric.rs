//! Metric space contract and a few ready-made element types.
//!
//! The tree only ever talks to [`MetricElement`]. The distance must be a true
//! metric (non-negative, zero only for equal elements, symmetric, triangle
//! inequality); nothing here checks that, and a violating metric makes both
//! insertion placement and search pruning undefined.

use std::fmt;

/// Integer distance between two elements, also the edge key in the tree.
pub type Distance = u32;

/// An element that can be indexed by a [`crate::Tree`].
///
/// # Example
/// ```
/// use bktree::{Distance, MetricElement};
///
/// struct Age(u32);
///
/// impl MetricElement for Age {
///     fn distance_to(&self, other: &Self) -> Distance {
///         self.0.abs_diff(other.0)
///     }
///
///     fn describe(&self) -> String {
///         self.0.to_string()
///     }
/// }
///
/// assert_eq!(Age(30).distance_to(&Age(42)), 12);
/// ```
pub trait MetricElement {
    fn distance_to(&self, other: &Self) -> Distance;

    /// Human readable form, used by the export snapshot.
    fn describe(&self) -> String;
}

/// A string compared by Levenshtein (edit) distance over chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Word(pub String);

impl Word {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Word {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Word {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl MetricElement for Word {
    fn distance_to(&self, other: &Self) -> Distance {
        levenshtein(&self.0, &other.0)
    }

    fn describe(&self) -> String {
        self.0.clone()
    }
}

/// Edit distance over chars with unit costs for insert, delete and substitute.
pub fn levenshtein(a: &str, b: &str) -> Distance {
    Distance::try_from(strsim::levenshtein(a, b)).unwrap_or(Distance::MAX)
}

/// A 64 bit fingerprint compared by Hamming distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bits(pub u64);

impl MetricElement for Bits {
    fn distance_to(&self, other: &Self) -> Distance {
        (self.0 ^ other.0).count_ones()
    }

    fn describe(&self) -> String {
        format!("{:#018x}", self.0)
    }
}

/// A position on the integer line, `d(a, b) = |a - b|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point(pub i32);

impl MetricElement for Point {
    fn distance_to(&self, other: &Self) -> Distance {
        self.0.abs_diff(other.0)
    }

    fn describe(&self) -> String {
        self.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "", 0)]
    #[case("", "abc", 3)]
    #[case("abc", "", 3)]
    #[case("kitten", "sitting", 3)]
    #[case("flaw", "lawn", 2)]
    #[case("book", "back", 2)]
    #[case("same", "same", 0)]
    #[case("über", "uber", 1)]
    fn test_levenshtein(#[case] a: &str, #[case] b: &str, #[case] expected: Distance) {
        assert_eq!(levenshtein(a, b), expected);
        assert_eq!(levenshtein(b, a), expected, "must be symmetric");
    }

    #[test]
    fn test_bits_hamming_distance() {
        assert_eq!(Bits(0b1010).distance_to(&Bits(0b0101)), 4);
        assert_eq!(Bits(u64::MAX).distance_to(&Bits(0)), 64);
        assert_eq!(Bits(7).distance_to(&Bits(7)), 0);
    }

    #[test]
    fn test_point_distance_handles_extremes() {
        assert_eq!(Point(-3).distance_to(&Point(4)), 7);
        assert_eq!(Point(i32::MIN).distance_to(&Point(i32::MAX)), u32::MAX);
    }

    #[test]
    fn test_describe() {
        assert_eq!(Word::from("book").describe(), "book");
        assert_eq!(Point(-12).describe(), "-12");
        assert_eq!(Bits(255).describe(), "0x00000000000000ff");
    }
}
