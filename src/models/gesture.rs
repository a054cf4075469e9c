use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate this point by another point treated as an offset.
    pub fn offset(self, by: Point) -> Point {
        Point::new(self.x.saturating_add(by.x), self.y.saturating_add(by.y))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        self.offset(rhs)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A completed multi-finger stroke as handed over by the recognizer.
///
/// `strokes` holds one path per finger, each ordered from first contact to
/// lift. The recognizer guarantees at least one non-empty path; dispatch
/// treats anything else as a contract violation and fails the gesture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizedGesture {
    pub strokes: Vec<Vec<Point>>,
}

impl RecognizedGesture {
    pub fn new(strokes: Vec<Vec<Point>>) -> Self {
        Self { strokes }
    }

    /// Build a gesture from tuple coordinates, mostly for tests and fixtures.
    pub fn from_coords(strokes: &[&[(i32, i32)]]) -> Self {
        Self {
            strokes: strokes
                .iter()
                .map(|path| path.iter().copied().map(Point::from).collect())
                .collect(),
        }
    }

    pub fn finger_count(&self) -> usize {
        self.strokes.len()
    }

    pub fn first_stroke(&self) -> Option<&[Point]> {
        self.strokes.first().map(Vec::as_slice)
    }

    pub fn last_stroke(&self) -> Option<&[Point]> {
        self.strokes.last().map(Vec::as_slice)
    }
}

/// Which point of a gesture anchors a position-dependent effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferencePointPolicy {
    /// Leave the pointer where it currently is.
    #[default]
    Original,
    /// First point of the first finger path.
    FirstDown,
    /// Last point of the first finger path.
    FirstUp,
    /// First point of the last finger path.
    LastDown,
    /// Last point of the last finger path.
    LastUp,
}

impl ReferencePointPolicy {
    pub const ALL: [ReferencePointPolicy; 5] = [
        ReferencePointPolicy::Original,
        ReferencePointPolicy::FirstDown,
        ReferencePointPolicy::FirstUp,
        ReferencePointPolicy::LastDown,
        ReferencePointPolicy::LastUp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferencePointPolicy::Original => "Original",
            ReferencePointPolicy::FirstDown => "FirstDown",
            ReferencePointPolicy::FirstUp => "FirstUp",
            ReferencePointPolicy::LastDown => "LastDown",
            ReferencePointPolicy::LastUp => "LastUp",
        }
    }

    /// Whether resolving this policy relocates the pointer.
    pub fn relocates_pointer(&self) -> bool {
        *self != ReferencePointPolicy::Original
    }
}

impl fmt::Display for ReferencePointPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown reference point policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reference point policy: {0}")]
pub struct UnknownPolicy(pub String);

impl FromStr for ReferencePointPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReferencePointPolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPolicy(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_offset() {
        let p = Point::new(10, 20).offset(Point::new(-5, 5));
        assert_eq!(p, Point::new(5, 25));
        assert_eq!(Point::new(1, 1) + Point::new(2, 3), Point::new(3, 4));
    }

    #[test]
    fn test_point_offset_saturates() {
        let p = Point::new(i32::MAX, i32::MIN).offset(Point::new(1, -1));
        assert_eq!(p, Point::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn test_point_display() {
        assert_eq!(Point::new(3, -4).to_string(), "(3, -4)");
    }

    #[test]
    fn test_gesture_from_coords() {
        let gesture = RecognizedGesture::from_coords(&[&[(0, 0), (5, 5)], &[(10, 10)]]);
        assert_eq!(gesture.finger_count(), 2);
        assert_eq!(gesture.first_stroke().unwrap().len(), 2);
        assert_eq!(gesture.last_stroke().unwrap()[0], Point::new(10, 10));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "lastup".parse::<ReferencePointPolicy>().unwrap(),
            ReferencePointPolicy::LastUp
        );
        assert_eq!(
            " FirstDown ".parse::<ReferencePointPolicy>().unwrap(),
            ReferencePointPolicy::FirstDown
        );
        assert!("Middle".parse::<ReferencePointPolicy>().is_err());
    }

    #[test]
    fn test_policy_relocates_pointer() {
        assert!(!ReferencePointPolicy::Original.relocates_pointer());
        assert!(ReferencePointPolicy::LastUp.relocates_pointer());
    }
}
