use crate::models::{Point, ReferencePointPolicy};
use crate::plugins::ActionError;
use crate::services::{EffectorError, InputEffector, MouseButton};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete button effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonEffect {
    Click,
    DoubleClick,
    Down,
    Up,
}

impl ButtonEffect {
    pub fn apply(self, effector: &dyn InputEffector, button: MouseButton) -> Result<(), EffectorError> {
        match self {
            ButtonEffect::Click => effector.button_click(button),
            ButtonEffect::DoubleClick => effector.button_double_click(button),
            ButtonEffect::Down => effector.button_down(button),
            ButtonEffect::Up => effector.button_up(button),
        }
    }
}

/// Every effect the mouse actions plugin can be configured for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseAction {
    #[default]
    LeftButtonClick,
    LeftButtonDoubleClick,
    LeftButtonDown,
    LeftButtonUp,
    RightButtonClick,
    RightButtonDoubleClick,
    RightButtonDown,
    RightButtonUp,
    MiddleButtonClick,
    MiddleButtonDoubleClick,
    MiddleButtonDown,
    MiddleButtonUp,
    XButton1Click,
    XButton1DoubleClick,
    XButton1Down,
    XButton1Up,
    XButton2Click,
    XButton2DoubleClick,
    XButton2Down,
    XButton2Up,
    HorizontalScroll,
    VerticalScroll,
    MoveMouseTo,
    MoveMouseBy,
}

impl MouseAction {
    pub const ALL: [MouseAction; 24] = [
        MouseAction::LeftButtonClick,
        MouseAction::LeftButtonDoubleClick,
        MouseAction::LeftButtonDown,
        MouseAction::LeftButtonUp,
        MouseAction::RightButtonClick,
        MouseAction::RightButtonDoubleClick,
        MouseAction::RightButtonDown,
        MouseAction::RightButtonUp,
        MouseAction::MiddleButtonClick,
        MouseAction::MiddleButtonDoubleClick,
        MouseAction::MiddleButtonDown,
        MouseAction::MiddleButtonUp,
        MouseAction::XButton1Click,
        MouseAction::XButton1DoubleClick,
        MouseAction::XButton1Down,
        MouseAction::XButton1Up,
        MouseAction::XButton2Click,
        MouseAction::XButton2DoubleClick,
        MouseAction::XButton2Down,
        MouseAction::XButton2Up,
        MouseAction::HorizontalScroll,
        MouseAction::VerticalScroll,
        MouseAction::MoveMouseTo,
        MouseAction::MoveMouseBy,
    ];

    /// Symbolic name, also used in serialized settings.
    pub fn name(&self) -> &'static str {
        match self {
            MouseAction::LeftButtonClick => "LeftButtonClick",
            MouseAction::LeftButtonDoubleClick => "LeftButtonDoubleClick",
            MouseAction::LeftButtonDown => "LeftButtonDown",
            MouseAction::LeftButtonUp => "LeftButtonUp",
            MouseAction::RightButtonClick => "RightButtonClick",
            MouseAction::RightButtonDoubleClick => "RightButtonDoubleClick",
            MouseAction::RightButtonDown => "RightButtonDown",
            MouseAction::RightButtonUp => "RightButtonUp",
            MouseAction::MiddleButtonClick => "MiddleButtonClick",
            MouseAction::MiddleButtonDoubleClick => "MiddleButtonDoubleClick",
            MouseAction::MiddleButtonDown => "MiddleButtonDown",
            MouseAction::MiddleButtonUp => "MiddleButtonUp",
            MouseAction::XButton1Click => "XButton1Click",
            MouseAction::XButton1DoubleClick => "XButton1DoubleClick",
            MouseAction::XButton1Down => "XButton1Down",
            MouseAction::XButton1Up => "XButton1Up",
            MouseAction::XButton2Click => "XButton2Click",
            MouseAction::XButton2DoubleClick => "XButton2DoubleClick",
            MouseAction::XButton2Down => "XButton2Down",
            MouseAction::XButton2Up => "XButton2Up",
            MouseAction::HorizontalScroll => "HorizontalScroll",
            MouseAction::VerticalScroll => "VerticalScroll",
            MouseAction::MoveMouseTo => "MoveMouseTo",
            MouseAction::MoveMouseBy => "MoveMouseBy",
        }
    }

    /// Button and effect for the button variants, `None` for scroll and move.
    pub fn button_effect(&self) -> Option<(MouseButton, ButtonEffect)> {
        use ButtonEffect::*;
        use MouseButton::*;

        Some(match self {
            MouseAction::LeftButtonClick => (Left, Click),
            MouseAction::LeftButtonDoubleClick => (Left, DoubleClick),
            MouseAction::LeftButtonDown => (Left, Down),
            MouseAction::LeftButtonUp => (Left, Up),
            MouseAction::RightButtonClick => (Right, Click),
            MouseAction::RightButtonDoubleClick => (Right, DoubleClick),
            MouseAction::RightButtonDown => (Right, Down),
            MouseAction::RightButtonUp => (Right, Up),
            MouseAction::MiddleButtonClick => (Middle, Click),
            MouseAction::MiddleButtonDoubleClick => (Middle, DoubleClick),
            MouseAction::MiddleButtonDown => (Middle, Down),
            MouseAction::MiddleButtonUp => (Middle, Up),
            MouseAction::XButton1Click => (XButton1, Click),
            MouseAction::XButton1DoubleClick => (XButton1, DoubleClick),
            MouseAction::XButton1Down => (XButton1, Down),
            MouseAction::XButton1Up => (XButton1, Up),
            MouseAction::XButton2Click => (XButton2, Click),
            MouseAction::XButton2DoubleClick => (XButton2, DoubleClick),
            MouseAction::XButton2Down => (XButton2, Down),
            MouseAction::XButton2Up => (XButton2, Up),
            MouseAction::HorizontalScroll
            | MouseAction::VerticalScroll
            | MouseAction::MoveMouseTo
            | MouseAction::MoveMouseBy => return None,
        })
    }

    /// Scroll and absolute moves do not depend on the gesture's geometry.
    pub fn is_position_independent(&self) -> bool {
        matches!(
            self,
            MouseAction::HorizontalScroll | MouseAction::VerticalScroll | MouseAction::MoveMouseTo
        )
    }

    pub fn is_extended_button(&self) -> bool {
        matches!(
            self.button_effect(),
            Some((MouseButton::XButton1 | MouseButton::XButton2, _))
        )
    }
}

impl fmt::Display for MouseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings of one mouse action binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MouseActionsSettings {
    pub mouse_action: MouseAction,
    pub click_position: ReferencePointPolicy,
    pub scroll_amount: i32,
    pub move_point: Point,
}

impl Default for MouseActionsSettings {
    fn default() -> Self {
        Self {
            mouse_action: MouseAction::LeftButtonClick,
            click_position: ReferencePointPolicy::Original,
            scroll_amount: 1,
            move_point: Point::default(),
        }
    }
}

/// Wire form accepted on read. The policy may be written by name or by its
/// numeric position, so it is validated separately.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct SettingsWire {
    mouse_action: MouseAction,
    #[serde(default)]
    click_position: Option<serde_json::Value>,
    #[serde(default)]
    scroll_amount: Option<i32>,
    #[serde(default)]
    move_point: Option<Point>,
}

fn parse_policy(value: serde_json::Value) -> Result<ReferencePointPolicy, ActionError> {
    match value {
        serde_json::Value::String(name) => Ok(name.parse::<ReferencePointPolicy>()?),
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|index| ReferencePointPolicy::ALL.get(index as usize).copied())
            .ok_or_else(|| ActionError::InvalidPolicy(n.to_string())),
        other => Err(ActionError::InvalidPolicy(other.to_string())),
    }
}

impl MouseActionsSettings {
    pub fn to_blob(&self) -> Result<String, ActionError> {
        serde_json::to_string(self).map_err(ActionError::MalformedSettings)
    }

    /// Parse a blob written by [`to_blob`](Self::to_blob). Missing optional
    /// fields take their defaults; unknown fields and unknown actions or
    /// policies are rejected.
    pub fn from_blob(blob: &str) -> Result<Self, ActionError> {
        let wire: SettingsWire =
            serde_json::from_str(blob.trim()).map_err(ActionError::MalformedSettings)?;
        let defaults = MouseActionsSettings::default();

        Ok(Self {
            mouse_action: wire.mouse_action,
            click_position: match wire.click_position {
                Some(value) => parse_policy(value)?,
                None => defaults.click_position,
            },
            scroll_amount: wire.scroll_amount.unwrap_or(defaults.scroll_amount),
            move_point: wire.move_point.unwrap_or(defaults.move_point),
        })
    }
}
