//! Data models shared by the settings store and the action plugins.
//!
//! - [`RecognizedGesture`]: the finished multi-finger stroke produced by the recognizer
//! - [`Point`]: screen coordinates used by strokes and pointer effects
//! - [`ReferencePointPolicy`]: which gesture point anchors a position-dependent effect
//! - [`Color`]: RGB color persisted as a hex triplet
//!
//! Everything here is plain data. Gestures are consumed read-only by dispatch and
//! never produced by this crate.

pub mod color;
pub mod gesture;

pub use color::{Color, ParseColorError};
pub use gesture::{Point, RecognizedGesture, ReferencePointPolicy, UnknownPolicy};
