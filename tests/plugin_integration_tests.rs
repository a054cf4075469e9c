//! Integration tests for the mouse action plugin
//!
//! These tests verify:
//! - Effects produced for each kind of binding
//! - Failure reporting through the host control
//! - Settings blob persistence and description text
//! - Serialization of concurrent gestures through a shared context

use gesture_core::models::{Point, RecognizedGesture, ReferencePointPolicy};
use gesture_core::plugins::mouse_actions::{MouseAction, MouseActionsEditor, MouseActionsSettings};
use gesture_core::plugins::{ActionError, ActionPlugin, HostControl, MouseActionsPlugin};
use gesture_core::services::{
    ActionContext, EffectorCall, EffectorError, InputEffector, MouseButton, TracingEffector,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Effector whose every operation is rejected.
struct RejectingEffector;

impl RejectingEffector {
    fn reject<T>(&self) -> Result<T, EffectorError> {
        Err(EffectorError::Unavailable("no input desktop".into()))
    }
}

impl InputEffector for RejectingEffector {
    fn move_to(&self, _: Point) -> Result<(), EffectorError> {
        self.reject()
    }
    fn move_by(&self, _: Point) -> Result<(), EffectorError> {
        self.reject()
    }
    fn horizontal_scroll(&self, _: i32) -> Result<(), EffectorError> {
        self.reject()
    }
    fn vertical_scroll(&self, _: i32) -> Result<(), EffectorError> {
        self.reject()
    }
    fn button_click(&self, _: MouseButton) -> Result<(), EffectorError> {
        self.reject()
    }
    fn button_double_click(&self, _: MouseButton) -> Result<(), EffectorError> {
        self.reject()
    }
    fn button_down(&self, _: MouseButton) -> Result<(), EffectorError> {
        self.reject()
    }
    fn button_up(&self, _: MouseButton) -> Result<(), EffectorError> {
        self.reject()
    }
}

#[derive(Default)]
struct CountingHost {
    failures: Mutex<Vec<String>>,
}

impl HostControl for CountingHost {
    fn action_failed(&self, plugin: &str, error: &ActionError) {
        self.failures.lock().unwrap().push(format!("{plugin}: {error}"));
    }
}

fn create_test_plugin() -> (MouseActionsPlugin, Arc<TracingEffector>) {
    let effector = Arc::new(TracingEffector::at(Point::new(500, 500)));
    let context = ActionContext::new(effector.clone()).with_settle_delay(Duration::ZERO);
    (MouseActionsPlugin::new(context), effector)
}

fn two_finger_gesture() -> RecognizedGesture {
    RecognizedGesture::from_coords(&[&[(0, 0), (5, 5)], &[(10, 10), (20, 20)]])
}

fn settings(action: MouseAction, policy: ReferencePointPolicy) -> MouseActionsSettings {
    MouseActionsSettings {
        mouse_action: action,
        click_position: policy,
        ..MouseActionsSettings::default()
    }
}

#[test]
fn test_last_up_double_click() {
    let (mut plugin, effector) = create_test_plugin();
    plugin.set_settings(settings(
        MouseAction::RightButtonDoubleClick,
        ReferencePointPolicy::LastUp,
    ));

    assert!(plugin.gestured(&two_finger_gesture()));
    assert_eq!(
        effector.calls(),
        vec![
            EffectorCall::MoveTo(Point::new(20, 20)),
            EffectorCall::DoubleClick(MouseButton::Right),
        ]
    );
}

#[test]
fn test_each_policy_anchors_click() {
    let expected = [
        (ReferencePointPolicy::FirstDown, Point::new(0, 0)),
        (ReferencePointPolicy::FirstUp, Point::new(5, 5)),
        (ReferencePointPolicy::LastDown, Point::new(10, 10)),
        (ReferencePointPolicy::LastUp, Point::new(20, 20)),
    ];

    for (policy, anchor) in expected {
        let (mut plugin, effector) = create_test_plugin();
        plugin.set_settings(settings(MouseAction::MiddleButtonClick, policy));

        assert!(plugin.gestured(&two_finger_gesture()), "{policy}");
        assert_eq!(effector.position(), anchor, "{policy}");
    }
}

#[test]
fn test_original_policy_clicks_in_place() {
    let (mut plugin, effector) = create_test_plugin();
    plugin.set_settings(settings(MouseAction::LeftButtonClick, ReferencePointPolicy::Original));

    assert!(plugin.gestured(&two_finger_gesture()));
    assert_eq!(effector.calls(), vec![EffectorCall::Click(MouseButton::Left)]);
    assert_eq!(effector.position(), Point::new(500, 500));
}

#[test]
fn test_extended_buttons() {
    let (mut plugin, effector) = create_test_plugin();
    plugin.set_settings(settings(MouseAction::XButton2Up, ReferencePointPolicy::FirstDown));

    assert!(plugin.gestured(&two_finger_gesture()));
    assert_eq!(
        effector.calls(),
        vec![
            EffectorCall::MoveTo(Point::new(0, 0)),
            EffectorCall::Up(MouseButton::XButton2),
        ]
    );
}

#[test]
fn test_scroll_and_move_bindings() {
    let (mut plugin, effector) = create_test_plugin();

    assert!(plugin.deserialize(
        r#"{"MouseAction":"HorizontalScroll","ClickPosition":"LastUp","ScrollAmount":-4}"#
    ));
    assert!(plugin.gestured(&two_finger_gesture()));

    assert!(plugin.deserialize(r#"{"MouseAction":"MoveMouseTo","MovePoint":{"x":7,"y":8}}"#));
    assert!(plugin.gestured(&two_finger_gesture()));

    assert!(plugin.deserialize(r#"{"MouseAction":"MoveMouseBy","MovePoint":{"x":1,"y":-1}}"#));
    assert!(plugin.gestured(&two_finger_gesture()));

    assert_eq!(
        effector.calls(),
        vec![
            EffectorCall::HorizontalScroll(-4),
            EffectorCall::MoveTo(Point::new(7, 8)),
            EffectorCall::MoveBy(Point::new(1, -1)),
        ]
    );
    assert_eq!(effector.position(), Point::new(8, 7));
}

#[test]
fn test_rejecting_effector_fails_every_action() {
    let host = Arc::new(CountingHost::default());
    let context = ActionContext::new(Arc::new(RejectingEffector)).with_settle_delay(Duration::ZERO);
    let mut plugin = MouseActionsPlugin::new(context.clone());
    plugin.set_host_control(host.clone());

    for action in MouseAction::ALL {
        plugin.set_settings(settings(action, ReferencePointPolicy::LastUp));
        assert!(!plugin.gestured(&two_finger_gesture()), "{action}");
    }

    assert_eq!(host.failures.lock().unwrap().len(), MouseAction::ALL.len());
    assert_eq!(context.metrics().gestures_failed(), MouseAction::ALL.len() as u64);
    assert_eq!(context.metrics().gestures_dispatched(), 0);
}

#[test]
fn test_unconfigured_plugin_does_nothing() {
    let (mut plugin, effector) = create_test_plugin();
    let host = Arc::new(CountingHost::default());
    plugin.set_host_control(host.clone());

    assert!(!plugin.gestured(&two_finger_gesture()));
    assert!(effector.calls().is_empty());
    assert!(host.failures.lock().unwrap()[0].contains("no settings"));
}

#[test]
fn test_description_follows_settings() {
    let (mut plugin, _effector) = create_test_plugin();
    assert_eq!(plugin.description(), "At current position click left button");

    assert!(plugin.deserialize(r#"{"MouseAction":"VerticalScroll","ScrollAmount":3}"#));
    assert_eq!(plugin.description(), "Scroll up by 3");

    plugin.set_settings(settings(MouseAction::LeftButtonDown, ReferencePointPolicy::FirstUp));
    assert_eq!(plugin.description(), "At first lift point press left button");
}

#[test]
fn test_invalid_blob_keeps_previous_settings() {
    let (mut plugin, _effector) = create_test_plugin();
    assert!(plugin.deserialize(r#"{"MouseAction":"XButton1Click","ClickPosition":"FirstUp"}"#));

    for blob in [
        "",
        "[]",
        r#"{"MouseAction":"Teleport"}"#,
        r#"{"MouseAction":"LeftButtonClick","ClickPosition":"Nowhere"}"#,
    ] {
        assert!(!plugin.deserialize(blob), "{blob:?}");
    }

    let current = plugin.settings().unwrap();
    assert_eq!(current.mouse_action, MouseAction::XButton1Click);
    assert_eq!(current.click_position, ReferencePointPolicy::FirstUp);
}

#[test]
fn test_serialize_round_trip_between_instances() {
    let (mut source, _) = create_test_plugin();
    source.set_settings(MouseActionsSettings {
        mouse_action: MouseAction::MoveMouseBy,
        click_position: ReferencePointPolicy::LastDown,
        scroll_amount: 6,
        move_point: Point::new(-3, 12),
    });

    let blob = source.serialize();
    let (mut target, _) = create_test_plugin();
    assert!(target.deserialize(&blob));
    assert_eq!(target.settings(), source.settings());
    assert_eq!(target.serialize(), blob);
}

#[test]
fn test_serialize_without_settings_yields_defaults() {
    let (mut plugin, _) = create_test_plugin();
    let blob = plugin.serialize();

    assert_eq!(
        MouseActionsSettings::from_blob(&blob).unwrap(),
        MouseActionsSettings::default()
    );
}

#[test]
fn test_editor_draft_committed_by_serialize() {
    let (mut plugin, _) = create_test_plugin();
    plugin.set_settings(settings(MouseAction::LeftButtonClick, ReferencePointPolicy::Original));

    {
        let editor = plugin
            .editor()
            .downcast_mut::<MouseActionsEditor>()
            .expect("mouse actions editor");
        editor.set_mouse_action(MouseAction::VerticalScroll);
        editor.set_scroll_amount(-1);
        assert_eq!(editor.preview(), "Scroll down by 1");
    }

    // Drafts are not live until committed
    assert_eq!(plugin.settings().unwrap().mouse_action, MouseAction::LeftButtonClick);

    let blob = plugin.serialize();
    assert!(blob.contains("VerticalScroll"));
    assert_eq!(plugin.description(), "Scroll down by 1");
}

#[test]
fn test_plugins_are_object_safe() {
    let (plugin, _) = create_test_plugin();
    let boxed: Box<dyn ActionPlugin> = Box::new(plugin);

    assert_eq!(boxed.name(), "Mouse Actions");
    assert_eq!(boxed.category(), "Mouse");
    assert!(boxed.is_action());
    assert!(!boxed.activate_window_default());
    assert!(boxed.host_control().is_none());
}

#[test]
fn test_shared_context_serializes_gestures() {
    let effector = Arc::new(TracingEffector::new());
    let context = ActionContext::new(effector.clone()).with_settle_delay(Duration::from_millis(2));

    let handles: Vec<_> = [
        (MouseAction::LeftButtonClick, ReferencePointPolicy::FirstDown),
        (MouseAction::RightButtonClick, ReferencePointPolicy::LastUp),
    ]
    .into_iter()
    .map(|(action, policy)| {
        let mut plugin = MouseActionsPlugin::new(context.clone());
        plugin.set_settings(settings(action, policy));
        thread::spawn(move || {
            for _ in 0..20 {
                assert!(plugin.gestured(&two_finger_gesture()));
            }
        })
    })
    .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Every relocation is immediately followed by the click it anchors
    let calls = effector.calls();
    assert_eq!(calls.len(), 80);
    for pair in calls.chunks(2) {
        match pair {
            [EffectorCall::MoveTo(p), EffectorCall::Click(MouseButton::Left)] => {
                assert_eq!(*p, Point::new(0, 0))
            }
            [EffectorCall::MoveTo(p), EffectorCall::Click(MouseButton::Right)] => {
                assert_eq!(*p, Point::new(20, 20))
            }
            other => panic!("interleaved effects: {other:?}"),
        }
    }
    assert_eq!(context.metrics().gestures_dispatched(), 40);
}
