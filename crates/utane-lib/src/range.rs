use std::ops;

/// A closed-open interval of song positions, in milliseconds.
#[derive(
    PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Debug, Default, serde::Serialize, serde::Deserialize,
)]
pub struct Range {
    pub start: i64,
    pub end: i64,
}

impl Range {
    pub const EMPTY: Self = Range { start: 0, end: 0 };
    pub const EVERYTHING: Self = Range {
        start: i64::MIN,
        end: i64::MAX,
    };

    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
    pub fn from_start_length(start: i64, length: i64) -> Self {
        Self {
            start,
            end: start.checked_add(length).expect("start + length overflows"),
        }
    }
    pub fn at(pos: i64) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
    pub fn unbounded_end(start: i64) -> Self {
        Self {
            start,
            end: i64::MAX,
        }
    }

    pub fn length(&self) -> i64 {
        self.end - self.start
    }
    pub fn valid(&self) -> bool {
        self.length() >= 0
    }

    pub fn contains(&self, pos: i64) -> bool {
        pos >= self.start && pos < self.end
    }

    pub fn intersect(&self, other: Self) -> Self {
        Self {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        }
    }
    pub fn intersects(&self, other: Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Smallest range covering both `self` and `other`.
    pub fn merge_with(&self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl ops::Add<i64> for Range {
    type Output = Self;
    fn add(self, rhs: i64) -> Self::Output {
        Self {
            start: self.start + rhs,
            end: self.end + rhs,
        }
    }
}

impl ops::AddAssign<i64> for Range {
    fn add_assign(&mut self, rhs: i64) {
        *self = *self + rhs;
    }
}

impl ops::Sub<i64> for Range {
    type Output = Self;
    fn sub(self, rhs: i64) -> Self::Output {
        self + -rhs
    }
}

impl ops::SubAssign<i64> for Range {
    fn sub_assign(&mut self, rhs: i64) {
        *self = *self - rhs;
    }
}
