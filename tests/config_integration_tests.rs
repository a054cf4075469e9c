//! Integration tests for SettingsStore and the persisted settings document
//!
//! These tests verify:
//! - Self-healing of corrupt entries across restarts
//! - Debounced, coalesced saves
//! - Local mirror fallback and preservation of foreign sections
//! - Reload and save notifications
//! - Save failure handling (storage errors and lock timeouts)

use camino::{Utf8Path, Utf8PathBuf};
use gesture_core::config::lock::lock_path_for;
use gesture_core::config::{AppConfig, ConfigChange, ConfigPaths, SettingsStore, StoreOptions};
use gesture_core::models::Color;
use std::fs;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

fn fast_options() -> StoreOptions {
    StoreOptions {
        debounce_ms: 20,
        lock_timeout_ms: 500,
        lock_poll_ms: 2,
    }
}

fn open_store(dir: &Utf8Path, options: StoreOptions) -> SettingsStore {
    SettingsStore::open(ConfigPaths::in_dir(dir), options).unwrap()
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_corrupt_value_heals_and_persists() {
    let (_temp_dir, dir) = create_test_config_dir();
    fs::write(dir.join("settings.yaml"), "appSettings:\n  Opacity: notanumber\n").unwrap();

    {
        let store = open_store(&dir, fast_options());
        assert_eq!(store.get_value("Opacity", 0.35), 0.35);
        store.flush();
    }

    let reopened = open_store(&dir, fast_options());
    assert_eq!(reopened.raw_value("Opacity").as_deref(), Some("0.35"));
    assert_eq!(reopened.get_value("Opacity", 0.0), 0.35);
}

#[test]
fn test_rapid_sets_coalesce_into_one_save() {
    let (_temp_dir, dir) = create_test_config_dir();
    let options = StoreOptions {
        debounce_ms: 200,
        ..fast_options()
    };
    let store = open_store(&dir, options);
    let keys: Vec<String> = (0..10).map(|i| format!("Coalesced{i}")).collect();

    for (i, key) in keys.iter().enumerate() {
        store.set_value(key, i as i32 * 10);
    }

    assert!(wait_until(Duration::from_secs(5), || store.metrics().saves_written() == 1));
    thread::sleep(Duration::from_millis(300));
    assert_eq!(store.metrics().saves_written(), 1);

    // The single write carried every final value
    let contents = fs::read_to_string(dir.join("settings.yaml")).unwrap();
    for key in &keys {
        assert!(contents.contains(key.as_str()), "{key}: {contents}");
    }

    drop(store);
    let reopened = open_store(&dir, fast_options());
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(reopened.get_value(key, -1), i as i32 * 10, "{key}");
    }
}

#[test]
fn test_typed_settings_survive_restart() {
    let (_temp_dir, dir) = create_test_config_dir();

    {
        let config = AppConfig::new(open_store(&dir, fast_options()));
        config.set_visual_feedback_color(Color::rgb(0x10, 0x20, 0x30));
        config.set_show_balloon_tip(true);
        config.set_minimum_point_distance(35);
        config.set_ui_access(true);
    }

    let config = AppConfig::new(open_store(&dir, fast_options()));
    assert_eq!(config.visual_feedback_color(), Color::rgb(0x10, 0x20, 0x30));
    assert!(config.show_balloon_tip());
    assert_eq!(config.minimum_point_distance(), 35);
    assert!(!config.ui_access());
    assert_eq!(config.store().raw_value("VisualFeedbackColor").as_deref(), Some("#102030"));
}

#[test]
fn test_hand_edited_scalars_are_read() {
    let (_temp_dir, dir) = create_test_config_dir();
    fs::write(
        dir.join("settings.yaml"),
        "appSettings:\n  VisualFeedbackWidth: 12\n  ShowTrayIcon: false\n  Opacity: 0.75\n",
    )
    .unwrap();

    let config = AppConfig::new(open_store(&dir, fast_options()));
    assert_eq!(config.visual_feedback_width(), 12);
    assert!(!config.show_tray_icon());
    assert_eq!(config.opacity(), 0.75);
    assert_eq!(config.store().metrics().self_heals(), 0);
}

#[test]
fn test_mirror_is_read_when_primary_missing() {
    let (_roaming, roaming_dir) = create_test_config_dir();
    let (_local, local_dir) = create_test_config_dir();
    fs::write(
        local_dir.join("settings.yaml"),
        "gestures:\n  - name: back\nappSettings:\n  CultureName: ja-JP\n",
    )
    .unwrap();

    let paths = ConfigPaths::in_dir(&roaming_dir).with_mirror_dir(&local_dir);
    let store = SettingsStore::open(paths, fast_options()).unwrap();
    assert_eq!(store.get_value("CultureName", String::new()), "ja-JP");

    store.set_value("InitialTimeout", 250);
    store.flush();

    for dir in [&roaming_dir, &local_dir] {
        let contents = fs::read_to_string(dir.join("settings.yaml")).unwrap();
        assert!(contents.contains("InitialTimeout"), "{dir}: {contents}");
        assert!(contents.contains("CultureName"), "{dir}: {contents}");
        assert!(contents.contains("gestures:"), "{dir}: {contents}");
        assert!(contents.contains("name: back"), "{dir}: {contents}");
    }
}

#[test]
fn test_foreign_sections_are_preserved() {
    let (_temp_dir, dir) = create_test_config_dir();
    fs::write(
        dir.join("settings.yaml"),
        "gestures:\n  - name: back\nappSettings:\n  Opacity: '0.5'\n",
    )
    .unwrap();

    let store = open_store(&dir, fast_options());
    store.set_value("ShowTrayIcon", false);
    store.flush();

    let contents = fs::read_to_string(dir.join("settings.yaml")).unwrap();
    assert!(contents.contains("gestures:"), "{contents}");
    assert!(contents.contains("name: back"), "{contents}");

    let reopened = open_store(&dir, fast_options());
    assert_eq!(reopened.get_value("Opacity", 0.35), 0.5);
    assert!(!reopened.get_value("ShowTrayIcon", true));
}

#[test]
fn test_two_handles_merge_their_changes() {
    let (_temp_dir, dir) = create_test_config_dir();
    let first = open_store(&dir, fast_options());
    let second = open_store(&dir, fast_options());

    first.set_value("VisualFeedbackWidth", 3);
    first.flush();
    second.set_value("MinimumPointDistance", 40);
    second.flush();

    let reopened = open_store(&dir, fast_options());
    assert_eq!(reopened.get_value("VisualFeedbackWidth", 0), 3);
    assert_eq!(reopened.get_value("MinimumPointDistance", 0), 40);

    // The second save read the first one back
    assert_eq!(second.get_value("VisualFeedbackWidth", 0), 3);
}

#[test]
fn test_reload_keeps_pending_changes() {
    let (_temp_dir, dir) = create_test_config_dir();
    let options = StoreOptions {
        debounce_ms: 10_000,
        ..fast_options()
    };
    let store = open_store(&dir, options);

    store.set_value("ShowBalloonTip", true);
    fs::write(dir.join("settings.yaml"), "appSettings:\n  CultureName: it-IT\n").unwrap();
    store.reload();

    assert_eq!(store.get_value("CultureName", String::new()), "it-IT");
    assert!(store.get_value("ShowBalloonTip", false));
    assert!(store.has_pending_save());
    assert_eq!(store.metrics().reloads(), 1);
}

#[test]
fn test_malformed_file_on_save_falls_back_to_reload() {
    let (_temp_dir, dir) = create_test_config_dir();
    let options = StoreOptions {
        debounce_ms: 10_000,
        ..fast_options()
    };
    let store = open_store(&dir, options);
    let mut changes = store.subscribe();

    fs::write(dir.join("settings.yaml"), "appSettings: [unclosed\n").unwrap();
    store.set_value("Opacity", 0.9);
    store.flush();

    assert_eq!(store.metrics().saves_written(), 0);
    assert_eq!(store.metrics().save_failures(), 1);
    assert_eq!(store.metrics().reload_failures(), 1);
    assert_eq!(store.get_value("Opacity", 0.35), 0.9);

    let change = tokio_test::block_on(changes.recv()).unwrap();
    assert_eq!(change, ConfigChange::Saved);
}

#[test]
fn test_lock_timeout_drops_save_until_next_flush() {
    let (_temp_dir, dir) = create_test_config_dir();
    let options = StoreOptions {
        debounce_ms: 10_000,
        lock_timeout_ms: 50,
        ..fast_options()
    };
    let store = open_store(&dir, options);
    let settings_file = dir.join("settings.yaml");
    let lock_file = lock_path_for(&settings_file);

    fs::write(&lock_file, "").unwrap();
    store.set_value("RegisterTouchPad", true);
    store.flush();

    assert_eq!(store.metrics().save_failures(), 1);
    assert_eq!(store.metrics().reload_failures(), 0);
    assert!(!settings_file.exists());

    fs::remove_file(&lock_file).unwrap();
    store.flush();

    assert_eq!(store.metrics().saves_written(), 1);
    assert!(!lock_file.exists());
    let reopened = open_store(&dir, fast_options());
    assert_eq!(reopened.raw_value("RegisterTouchPad").as_deref(), Some("True"));
}

#[tokio::test]
async fn test_reload_notifies_subscribers() {
    let (_temp_dir, dir) = create_test_config_dir();
    let store = open_store(&dir, fast_options());
    let mut changes = store.subscribe();

    store.reload();

    let change = tokio::time::timeout(Duration::from_millis(500), changes.recv())
        .await
        .expect("Timeout waiting for reload notification")
        .unwrap();
    assert_eq!(change, ConfigChange::Reloaded);
}

#[tokio::test]
async fn test_debounced_save_notifies_subscribers() {
    let (_temp_dir, dir) = create_test_config_dir();
    let store = open_store(&dir, fast_options());
    let mut changes = store.subscribe();

    store.set_value("IsOrderByLocation", false);

    let change = tokio::time::timeout(Duration::from_secs(5), changes.recv())
        .await
        .expect("Timeout waiting for save notification")
        .unwrap();
    assert_eq!(change, ConfigChange::Saved);
    assert!(!store.has_pending_save());
}
