use super::description::describe;
use super::settings::{MouseAction, MouseActionsSettings};
use crate::models::{Point, ReferencePointPolicy};

/// Draft settings edited by the host UI.
///
/// Changes stay in the draft until the plugin commits them or serializes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseActionsEditor {
    draft: MouseActionsSettings,
    dirty: bool,
}

impl MouseActionsEditor {
    pub fn new(settings: MouseActionsSettings) -> Self {
        Self {
            draft: settings,
            dirty: false,
        }
    }

    pub fn settings(&self) -> &MouseActionsSettings {
        &self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_mouse_action(&mut self, action: MouseAction) {
        self.draft.mouse_action = action;
        self.dirty = true;
    }

    pub fn set_click_position(&mut self, policy: ReferencePointPolicy) {
        self.draft.click_position = policy;
        self.dirty = true;
    }

    pub fn set_scroll_amount(&mut self, amount: i32) {
        self.draft.scroll_amount = amount;
        self.dirty = true;
    }

    pub fn set_move_point(&mut self, point: Point) {
        self.draft.move_point = point;
        self.dirty = true;
    }

    /// Whether the policy picker applies to the selected action.
    pub fn uses_click_position(&self) -> bool {
        !self.draft.mouse_action.is_position_independent()
    }

    /// Preview of the draft as it would appear in the gesture list.
    pub fn preview(&self) -> String {
        describe(&self.draft)
    }

    /// Discard the draft in favour of `settings`.
    pub(crate) fn reset(&mut self, settings: MouseActionsSettings) {
        self.draft = settings;
        self.dirty = false;
    }

    /// Hand out the draft and mark it clean.
    pub(crate) fn take_committed(&mut self) -> MouseActionsSettings {
        self.dirty = false;
        self.draft.clone()
    }
}
