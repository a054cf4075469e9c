//! Services module - the pieces action plugins build their effects from.
//!
//! # Components
//!
//! - [`reference_point`]: pure resolution of a [`ReferencePointPolicy`](crate::models::ReferencePointPolicy)
//!   against a recognized gesture
//! - [`effector`]: the [`InputEffector`] contract for the service that moves the real pointer and
//!   presses real buttons, plus:
//!   - [`ActionContext`]: effector handle, dispatch gate, settle delay and metrics handed to plugins
//!   - [`TracingEffector`]: an effector that only logs and journals, for dry runs and tests
//!
//! # Design Philosophy
//!
//! Nothing here knows about plugin settings or serialization. The OS-level injection primitives
//! live behind [`InputEffector`] and are supplied by the host.

pub mod effector;
pub mod reference_point;

pub use effector::{
    ActionContext, DEFAULT_SETTLE_DELAY, EffectorCall, EffectorError, InputEffector, MouseButton,
    TracingEffector,
};
pub use reference_point::{ResolveError, resolve};

#[cfg(test)]
pub use effector::MockInputEffector;
