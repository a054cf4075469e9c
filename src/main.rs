//! GestureCore - gesture action dispatch harness
//!
//! Dispatches one mouse action binding over one recorded gesture through an
//! effector that only logs, so bindings can be checked without moving the
//! real pointer.
//!
//! # Usage
//!
//! ```text
//! gesture-core <binding.json> <gesture.json> [--debug]
//! ```
//!
//! - `binding.json`: a mouse action settings blob, e.g.
//!   `{"MouseAction":"LeftButtonClick","ClickPosition":"LastUp"}`
//! - `gesture.json`: a recognized gesture, e.g.
//!   `{"strokes":[[{"x":0,"y":0},{"x":5,"y":5}]]}`
//!
//! # Execution Flow
//!
//! 1. Initialize logging under the local data directory
//! 2. Open the settings store and log the current application settings
//! 3. Start a tokio runtime that logs settings change notifications
//! 4. Load the binding and the gesture, dispatch, log the effects
//! 5. Flush settings and log the metrics summary

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use gesture_core::config::{AppConfig, ConfigChange, ConfigPaths, SettingsStore, StoreOptions};
use gesture_core::plugins::{ActionError, ActionPlugin, HostControl, MouseActionsPlugin};
use gesture_core::services::{ActionContext, TracingEffector};
use gesture_core::{APP_NAME, Metrics, Point, RecognizedGesture, VERSION};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Records the time of the last failed action, as the host application does
/// before offering an error report.
struct HarnessHost {
    config: Arc<AppConfig>,
}

impl HostControl for HarnessHost {
    fn action_failed(&self, plugin: &str, error: &ActionError) {
        tracing::error!("{} failed: {}", plugin, error);
        if self.config.send_error_report() {
            self.config
                .set_last_error_time(chrono::Local::now().naive_local());
        }
    }
}

struct Args {
    binding: Utf8PathBuf,
    gesture: Utf8PathBuf,
    debug: bool,
}

fn parse_args() -> Result<Args> {
    let mut debug = false;
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--debug" | "-d" => debug = true,
            _ => positional.push(Utf8PathBuf::from(arg)),
        }
    }

    match <[Utf8PathBuf; 2]>::try_from(positional) {
        Ok([binding, gesture]) => Ok(Args {
            binding,
            gesture,
            debug,
        }),
        Err(_) => bail!("usage: {} <binding.json> <gesture.json> [--debug]", APP_NAME),
    }
}

fn log_settings(config: &AppConfig) {
    tracing::info!(
        "Visual feedback: color={}, width={}, opacity={}",
        config.visual_feedback_color(),
        config.visual_feedback_width(),
        config.opacity()
    );
    tracing::info!(
        "Recognition: minimum point distance={}, initial timeout={}, drawing button={:?}, touch pad={}",
        config.minimum_point_distance(),
        config.initial_timeout(),
        config.drawing_button(),
        config.register_touch_pad()
    );
    tracing::info!(
        "Shell: tray icon={}, balloon tip={}, order by location={}, culture={:?}, last error={}",
        config.show_tray_icon(),
        config.show_balloon_tip(),
        config.is_order_by_location(),
        config.culture_name(),
        config.last_error_time()
    );
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let log_dir = gesture_core::logging::default_log_dir()?;
    let _log_guard = gesture_core::logging::setup_logging_with_console(
        &log_dir,
        gesture_core::logging::LOG_PREFIX,
        args.debug,
        true,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let metrics = Arc::new(Metrics::new());
    let options = StoreOptions::from_env().context("Invalid settings store options")?;
    let store = SettingsStore::open_with_metrics(ConfigPaths::user_default()?, options, metrics.clone())
        .context("Failed to open settings store")?;
    let config = Arc::new(AppConfig::new(store.clone()));
    log_settings(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(1)
        .thread_name("gesture-core-worker")
        .build()?;

    let mut changes = store.subscribe();
    runtime.spawn(async move {
        loop {
            match changes.recv().await {
                Ok(ConfigChange::Saved) => tracing::info!("Settings saved"),
                Ok(ConfigChange::Reloaded) => tracing::info!("Settings reloaded from disk"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} settings notifications", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let blob = fs::read_to_string(&args.binding)
        .with_context(|| format!("Failed to read binding: {}", args.binding))?;
    let gesture_json = fs::read_to_string(&args.gesture)
        .with_context(|| format!("Failed to read gesture: {}", args.gesture))?;
    let gesture: RecognizedGesture = serde_json::from_str(&gesture_json)
        .with_context(|| format!("Malformed gesture: {}", args.gesture))?;

    let effector = Arc::new(TracingEffector::at(Point::new(0, 0)));
    let context = ActionContext::new(effector.clone()).with_metrics(metrics.clone());
    let mut plugin = MouseActionsPlugin::new(context);
    plugin.set_host_control(Arc::new(HarnessHost {
        config: config.clone(),
    }));

    if !plugin.deserialize(&blob) {
        bail!("Binding {} is not a valid mouse action", args.binding);
    }
    tracing::info!("Binding: {}", plugin.description());

    let succeeded = plugin.gestured(&gesture);
    for call in effector.calls() {
        tracing::info!("Effect: {:?}", call);
    }
    tracing::info!(
        "Dispatch {} (virtual pointer at {})",
        if succeeded { "succeeded" } else { "failed" },
        effector.position()
    );

    store.flush();
    metrics.log_summary();

    drop(config);
    drop(store);
    runtime.shutdown_timeout(Duration::from_secs(2));

    tracing::info!("Harness shutdown complete");
    Ok(())
}
