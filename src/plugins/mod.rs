//! Action plugins - configurable effects bound to recognized gestures.
//!
//! An [`ActionPlugin`] is configured from an opaque settings blob, describes
//! itself for the gesture list UI and performs its effect when its gesture is
//! recognized. The host owns plugin instances and hands each one a
//! [`HostControl`] for reporting failures.
//!
//! [`mouse_actions`] is the pointer-effect variant family.

pub mod mouse_actions;

use crate::models::{RecognizedGesture, UnknownPolicy};
use crate::services::{EffectorError, ResolveError};
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

pub use mouse_actions::{MouseAction, MouseActionsEditor, MouseActionsPlugin, MouseActionsSettings};

/// Errors from configuring or dispatching an action.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Action has no settings")]
    NoSettings,

    #[error("Input effector failed: {0}")]
    Effector(#[from] EffectorError),

    #[error("Invalid reference point policy: {0}")]
    InvalidPolicy(String),

    #[error("Malformed gesture: {0}")]
    Gesture(#[from] ResolveError),

    #[error("No pointer operation registered for {0}")]
    UnregisteredOperation(MouseAction),

    #[error("Malformed settings: {0}")]
    MalformedSettings(#[source] serde_json::Error),

    #[error("Action panicked: {0}")]
    Panicked(String),
}

impl From<UnknownPolicy> for ActionError {
    fn from(err: UnknownPolicy) -> Self {
        ActionError::InvalidPolicy(err.0)
    }
}

/// Icon shown next to an action in the host's action picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    Mouse,
    Keyboard,
    /// Path or resource name understood by the host.
    Named(String),
}

/// Services the host offers to plugin instances.
pub trait HostControl: Send + Sync {
    /// An action could not perform its effect.
    fn action_failed(&self, plugin: &str, error: &ActionError);
}

/// Contract between the host and one configured action.
///
/// Object safe: the host keeps instances as `Box<dyn ActionPlugin>`.
pub trait ActionPlugin: Send {
    fn name(&self) -> &str;

    /// Human-readable summary of the current settings.
    fn description(&self) -> String;

    fn category(&self) -> &str;

    fn icon(&self) -> IconSource;

    /// Whether the host should activate the target window before dispatch.
    fn activate_window_default(&self) -> bool;

    fn is_action(&self) -> bool;

    fn initialize(&mut self);

    /// Replace the settings from `blob`. On failure the previous settings
    /// stay in place and `false` is returned.
    fn deserialize(&mut self, blob: &str) -> bool;

    /// Current settings as a blob, defaults when none are set. Never fails.
    fn serialize(&mut self) -> String;

    /// Perform the configured effect. Never panics; any failure is reported
    /// to the host control and yields `false`.
    fn gestured(&mut self, gesture: &RecognizedGesture) -> bool;

    fn host_control(&self) -> Option<&Arc<dyn HostControl>>;

    fn set_host_control(&mut self, host: Arc<dyn HostControl>);

    /// Settings editor bound to this instance. The host downcasts it to the
    /// plugin's concrete editor type.
    fn editor(&mut self) -> &mut dyn Any;
}
