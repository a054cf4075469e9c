use super::value::{ConfigValue, ValueParseError, min_timestamp};
use super::SettingsStore;
use crate::models::Color;
use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mouse button that starts drawing a gesture.
///
/// Persisted as its button flag value (the companion process writes the same
/// codes), e.g. `2097152` for the right button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DrawingButton {
    #[default]
    None,
    Left,
    Right,
    Middle,
    XButton1,
    XButton2,
}

impl DrawingButton {
    pub fn code(&self) -> i32 {
        match self {
            DrawingButton::None => 0,
            DrawingButton::Left => 0x0010_0000,
            DrawingButton::Right => 0x0020_0000,
            DrawingButton::Middle => 0x0040_0000,
            DrawingButton::XButton1 => 0x0080_0000,
            DrawingButton::XButton2 => 0x0100_0000,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => DrawingButton::None,
            0x0010_0000 => DrawingButton::Left,
            0x0020_0000 => DrawingButton::Right,
            0x0040_0000 => DrawingButton::Middle,
            0x0080_0000 => DrawingButton::XButton1,
            0x0100_0000 => DrawingButton::XButton2,
            _ => return None,
        })
    }
}

impl ConfigValue for DrawingButton {
    fn from_config_str(raw: &str) -> Result<Self, ValueParseError> {
        raw.trim()
            .parse::<i32>()
            .ok()
            .and_then(DrawingButton::from_code)
            .ok_or_else(|| ValueParseError::new("drawing button", raw))
    }

    fn to_config_string(&self) -> String {
        self.code().to_string()
    }
}

/// Setting keys used by the application.
pub mod keys {
    pub const VISUAL_FEEDBACK_COLOR: &str = "VisualFeedbackColor";
    pub const VISUAL_FEEDBACK_WIDTH: &str = "VisualFeedbackWidth";
    pub const MINIMUM_POINT_DISTANCE: &str = "MinimumPointDistance";
    pub const OPACITY: &str = "Opacity";
    pub const IS_ORDER_BY_LOCATION: &str = "IsOrderByLocation";
    pub const SHOW_TRAY_ICON: &str = "ShowTrayIcon";
    pub const SHOW_BALLOON_TIP: &str = "ShowBalloonTip";
    pub const CULTURE_NAME: &str = "CultureName";
    pub const SEND_ERROR_REPORT: &str = "SendErrorReport";
    pub const LAST_ERROR_TIME: &str = "LastErrorTime";
    pub const INITIAL_TIMEOUT: &str = "InitialTimeout";
    pub const DRAWING_BUTTON: &str = "DrawingButton";
    pub const REGISTER_TOUCH_PAD: &str = "RegisterTouchPad";
}

/// Typed view over the application's known settings.
///
/// Every getter goes through [`SettingsStore::get_value`], so a corrupt
/// entry comes back as its default and is rewritten.
#[derive(Debug)]
pub struct AppConfig {
    store: SettingsStore,
    ui_access: AtomicBool,
}

macro_rules! setting {
    ($get:ident, $set:ident, $key:expr, $ty:ty, $default:expr) => {
        pub fn $get(&self) -> $ty {
            self.store.get_value($key, $default)
        }

        pub fn $set(&self, value: $ty) {
            self.store.set_value($key, value);
        }
    };
}

impl AppConfig {
    pub fn new(store: SettingsStore) -> Self {
        Self {
            store,
            ui_access: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    setting!(visual_feedback_color, set_visual_feedback_color, keys::VISUAL_FEEDBACK_COLOR, Color, Color::DEEP_SKY_BLUE);
    setting!(visual_feedback_width, set_visual_feedback_width, keys::VISUAL_FEEDBACK_WIDTH, i32, 9);
    setting!(minimum_point_distance, set_minimum_point_distance, keys::MINIMUM_POINT_DISTANCE, i32, 20);
    setting!(opacity, set_opacity, keys::OPACITY, f64, 0.35);
    setting!(is_order_by_location, set_is_order_by_location, keys::IS_ORDER_BY_LOCATION, bool, true);
    setting!(show_tray_icon, set_show_tray_icon, keys::SHOW_TRAY_ICON, bool, true);
    setting!(show_balloon_tip, set_show_balloon_tip, keys::SHOW_BALLOON_TIP, bool, false);
    setting!(culture_name, set_culture_name, keys::CULTURE_NAME, String, String::new());
    setting!(send_error_report, set_send_error_report, keys::SEND_ERROR_REPORT, bool, true);
    setting!(last_error_time, set_last_error_time, keys::LAST_ERROR_TIME, NaiveDateTime, min_timestamp());
    setting!(initial_timeout, set_initial_timeout, keys::INITIAL_TIMEOUT, i32, 0);
    setting!(drawing_button, set_drawing_button, keys::DRAWING_BUTTON, DrawingButton, DrawingButton::None);
    setting!(register_touch_pad, set_register_touch_pad, keys::REGISTER_TOUCH_PAD, bool, false);

    /// Whether the process runs with UI access rights. Process state only,
    /// never persisted.
    pub fn ui_access(&self) -> bool {
        self.ui_access.load(Ordering::Relaxed)
    }

    pub fn set_ui_access(&self, enabled: bool) {
        self.ui_access.store(enabled, Ordering::Relaxed);
    }
}
