// GestureCore - gesture action dispatch and persisted application settings
//
// This is the library crate containing the settings store, the action plugin
// contract and the mouse action plugin. The binary crate (main.rs) is a small
// harness that dispatches one binding over a recorded gesture.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod plugins;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{AppConfig, ConfigChange, ConfigPaths, SettingsStore, StoreError, StoreOptions};
pub use metrics::Metrics;
pub use models::{Point, RecognizedGesture, ReferencePointPolicy};
pub use plugins::{ActionError, ActionPlugin, HostControl, MouseActionsPlugin};
pub use services::{ActionContext, InputEffector};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
