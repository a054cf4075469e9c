//! Human-readable descriptions of mouse action settings.
//!
//! Button actions are described by decomposing the symbolic action name
//! against closed tables of button and verb segments, so adding a variant
//! only needs a name that follows the `<Button><Verb>` pattern.

use super::settings::{MouseAction, MouseActionsSettings};
use crate::models::ReferencePointPolicy;

const BUTTON_LABELS: [(&str, &str); 5] = [
    ("LeftButton", "left button"),
    ("RightButton", "right button"),
    ("MiddleButton", "middle button"),
    ("XButton1", "extended button 1"),
    ("XButton2", "extended button 2"),
];

// DoubleClick before Click: lookup is by suffix.
const VERB_LABELS: [(&str, &str); 4] = [
    ("DoubleClick", "double-click"),
    ("Click", "click"),
    ("Down", "press"),
    ("Up", "release"),
];

pub fn policy_label(policy: ReferencePointPolicy) -> &'static str {
    match policy {
        ReferencePointPolicy::Original => "At current position",
        ReferencePointPolicy::FirstDown => "At first touch point",
        ReferencePointPolicy::FirstUp => "At first lift point",
        ReferencePointPolicy::LastDown => "At last touch point",
        ReferencePointPolicy::LastUp => "At last lift point",
    }
}

/// Split a button action name into its button and verb labels.
fn decompose(name: &str) -> Option<(&'static str, &'static str)> {
    let (verb_segment, verb) = VERB_LABELS
        .into_iter()
        .find(|(segment, _)| name.ends_with(segment))?;
    let button_segment = &name[..name.len() - verb_segment.len()];
    let (_, button) = BUTTON_LABELS
        .into_iter()
        .find(|(segment, _)| *segment == button_segment)?;
    Some((button, verb))
}

/// Describe `settings` for the gesture list.
pub fn describe(settings: &MouseActionsSettings) -> String {
    match settings.mouse_action {
        MouseAction::VerticalScroll => {
            let direction = if settings.scroll_amount >= 0 { "up" } else { "down" };
            format!("Scroll {direction} by {}", settings.scroll_amount.unsigned_abs())
        }
        MouseAction::HorizontalScroll => {
            let direction = if settings.scroll_amount >= 0 { "right" } else { "left" };
            format!("Scroll {direction} by {}", settings.scroll_amount.unsigned_abs())
        }
        MouseAction::MoveMouseTo => format!("Move mouse to {}", settings.move_point),
        MouseAction::MoveMouseBy => {
            if settings.click_position.relocates_pointer() {
                format!(
                    "{}, move mouse by {}",
                    policy_label(settings.click_position),
                    settings.move_point
                )
            } else {
                format!("Move mouse by {}", settings.move_point)
            }
        }
        action => match decompose(action.name()) {
            Some((button, verb)) => {
                format!("{} {verb} {button}", policy_label(settings.click_position))
            }
            None => action.name().to_string(),
        },
    }
}
