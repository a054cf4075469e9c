//! Reference point resolution for position-dependent effects.
//!
//! Turns a [`ReferencePointPolicy`] and a [`RecognizedGesture`] into the
//! single point an effect is anchored at. Pure: the gesture is only read.

use crate::models::{Point, RecognizedGesture, ReferencePointPolicy};
use thiserror::Error;

/// The gesture handed over by the recognizer does not have the shape
/// dispatch relies on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Gesture has no finger paths")]
    EmptyGesture,

    #[error("Finger path {0} has no points")]
    EmptyStroke(usize),
}

/// Resolve `policy` against `gesture`.
///
/// `current` is the pointer position used by [`ReferencePointPolicy::Original`].
/// Malformed gestures are reported, never defaulted.
pub fn resolve(
    policy: ReferencePointPolicy,
    gesture: &RecognizedGesture,
    current: Point,
) -> Result<Point, ResolveError> {
    let first_index = 0;
    let last_index = gesture.strokes.len().saturating_sub(1);

    match policy {
        ReferencePointPolicy::Original => Ok(current),
        ReferencePointPolicy::FirstDown => stroke(gesture, first_index)?
            .first()
            .copied()
            .ok_or(ResolveError::EmptyStroke(first_index)),
        ReferencePointPolicy::FirstUp => stroke(gesture, first_index)?
            .last()
            .copied()
            .ok_or(ResolveError::EmptyStroke(first_index)),
        ReferencePointPolicy::LastDown => stroke(gesture, last_index)?
            .first()
            .copied()
            .ok_or(ResolveError::EmptyStroke(last_index)),
        ReferencePointPolicy::LastUp => stroke(gesture, last_index)?
            .last()
            .copied()
            .ok_or(ResolveError::EmptyStroke(last_index)),
    }
}

fn stroke(gesture: &RecognizedGesture, index: usize) -> Result<&[Point], ResolveError> {
    gesture
        .strokes
        .get(index)
        .map(Vec::as_slice)
        .ok_or(ResolveError::EmptyGesture)
}
