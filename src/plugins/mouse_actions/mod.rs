//! Mouse actions: click, press, release, scroll and move the pointer when a
//! gesture is recognized.

pub mod description;
pub mod editor;
pub mod operations;
pub mod settings;

pub use editor::MouseActionsEditor;
pub use operations::{OperationTable, PointerOperation};
pub use settings::{ButtonEffect, MouseAction, MouseActionsSettings};

use crate::models::{Point, RecognizedGesture};
use crate::plugins::{ActionError, ActionPlugin, HostControl, IconSource};
use crate::services::{ActionContext, resolve};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

pub const PLUGIN_NAME: &str = "Mouse Actions";
pub const PLUGIN_CATEGORY: &str = "Mouse";

/// Action plugin performing one configured [`MouseAction`].
pub struct MouseActionsPlugin {
    context: ActionContext,
    operations: Arc<OperationTable>,
    settings: Option<MouseActionsSettings>,
    editor: Option<MouseActionsEditor>,
    host: Option<Arc<dyn HostControl>>,
}

impl fmt::Debug for MouseActionsPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MouseActionsPlugin")
            .field("settings", &self.settings)
            .field("editor", &self.editor)
            .field("has_host", &self.host.is_some())
            .finish_non_exhaustive()
    }
}

impl MouseActionsPlugin {
    /// New instance using the standard operation table.
    pub fn new(context: ActionContext) -> Self {
        Self::with_operations(context, Arc::new(OperationTable::standard()))
    }

    pub fn with_operations(context: ActionContext, operations: Arc<OperationTable>) -> Self {
        Self {
            context,
            operations,
            settings: None,
            editor: None,
            host: None,
        }
    }

    pub fn settings(&self) -> Option<&MouseActionsSettings> {
        self.settings.as_ref()
    }

    pub fn set_settings(&mut self, settings: MouseActionsSettings) {
        if let Some(editor) = self.editor.as_mut() {
            editor.reset(settings.clone());
        }
        self.settings = Some(settings);
    }

    /// Typed access to the editor, created on first use.
    pub fn mouse_editor(&mut self) -> &mut MouseActionsEditor {
        let seed = self.settings.clone().unwrap_or_default();
        self.editor.get_or_insert_with(|| MouseActionsEditor::new(seed))
    }

    /// Adopt the editor's draft as the current settings. Returns whether an
    /// editor existed.
    pub fn commit_editor(&mut self) -> bool {
        match self.editor.as_mut() {
            Some(editor) => {
                self.settings = Some(editor.take_committed());
                true
            }
            None => false,
        }
    }

    /// Perform the configured effect, reporting why it could not be done.
    pub fn try_gestured(&self, gesture: &RecognizedGesture) -> Result<(), ActionError> {
        let settings = self.settings.as_ref().ok_or(ActionError::NoSettings)?;
        let effector = self.context.effector();
        let policy = settings.click_position;
        let _gate = self.context.exclusive();

        debug!(
            "Dispatching {} ({}) for a {}-finger gesture",
            settings.mouse_action,
            policy,
            gesture.finger_count()
        );

        match settings.mouse_action {
            MouseAction::HorizontalScroll => {
                effector.horizontal_scroll(settings.scroll_amount)?;
                self.context.settle();
            }
            MouseAction::VerticalScroll => {
                effector.vertical_scroll(settings.scroll_amount)?;
                self.context.settle();
            }
            MouseAction::MoveMouseTo => effector.move_to(settings.move_point)?,
            MouseAction::MoveMouseBy => match self.anchor(settings, gesture)? {
                Some(anchor) => effector.move_to(anchor.offset(settings.move_point))?,
                None => effector.move_by(settings.move_point)?,
            },
            action => {
                let (button, effect) = action
                    .button_effect()
                    .ok_or(ActionError::UnregisteredOperation(action))?;

                if let Some(anchor) = self.anchor(settings, gesture)? {
                    effector.move_to(anchor)?;
                }

                if action.is_extended_button() {
                    effect.apply(effector, button)?;
                } else {
                    let operation = self
                        .operations
                        .get(action)
                        .ok_or(ActionError::UnregisteredOperation(action))?;
                    operation(effector)?;
                }
                self.context.settle();
            }
        }

        Ok(())
    }

    /// Point the effect is anchored at, `None` when the pointer stays put.
    fn anchor(
        &self,
        settings: &MouseActionsSettings,
        gesture: &RecognizedGesture,
    ) -> Result<Option<Point>, ActionError> {
        if !settings.click_position.relocates_pointer() {
            return Ok(None);
        }
        // The current position only matters for the non-relocating policy
        Ok(Some(resolve(settings.click_position, gesture, Point::default())?))
    }

    fn effective_settings(&self) -> MouseActionsSettings {
        self.settings.clone().unwrap_or_default()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl ActionPlugin for MouseActionsPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn description(&self) -> String {
        description::describe(&self.effective_settings())
    }

    fn category(&self) -> &str {
        PLUGIN_CATEGORY
    }

    fn icon(&self) -> IconSource {
        IconSource::Mouse
    }

    fn activate_window_default(&self) -> bool {
        false
    }

    fn is_action(&self) -> bool {
        true
    }

    fn initialize(&mut self) {}

    fn deserialize(&mut self, blob: &str) -> bool {
        match MouseActionsSettings::from_blob(blob) {
            Ok(settings) => {
                self.set_settings(settings);
                true
            }
            Err(e) => {
                warn!("Ignoring mouse action settings: {}", e);
                false
            }
        }
    }

    fn serialize(&mut self) -> String {
        self.commit_editor();
        let settings = self.effective_settings();
        self.settings = Some(settings.clone());

        settings.to_blob().unwrap_or_else(|e| {
            error!("Failed to serialize mouse action settings: {}", e);
            String::new()
        })
    }

    fn gestured(&mut self, gesture: &RecognizedGesture) -> bool {
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.try_gestured(gesture)))
            .unwrap_or_else(|payload| Err(ActionError::Panicked(panic_message(payload))));

        let metrics = self.context.metrics();
        match result {
            Ok(()) => {
                metrics.record_dispatch(started.elapsed());
                true
            }
            Err(e) => {
                metrics.record_dispatch_failure();
                warn!("Mouse action failed: {}", e);
                if let Some(host) = &self.host {
                    host.action_failed(PLUGIN_NAME, &e);
                }
                false
            }
        }
    }

    fn host_control(&self) -> Option<&Arc<dyn HostControl>> {
        self.host.as_ref()
    }

    fn set_host_control(&mut self, host: Arc<dyn HostControl>) {
        self.host = Some(host);
    }

    fn editor(&mut self) -> &mut dyn Any {
        self.mouse_editor()
    }
}
