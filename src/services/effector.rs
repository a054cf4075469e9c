use crate::metrics::Metrics;
use crate::models::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Pause after discrete button effects so downstream input processing can
/// catch up.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(30);

/// Logical mouse buttons, including the two extended buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    XButton1,
    XButton2,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MouseButton::Left => "Left",
            MouseButton::Right => "Right",
            MouseButton::Middle => "Middle",
            MouseButton::XButton1 => "XButton1",
            MouseButton::XButton2 => "XButton2",
        };
        f.write_str(name)
    }
}

/// Errors reported by an input effector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectorError {
    #[error("Synthetic input was rejected: {0}")]
    Rejected(String),

    #[error("Input injection is not available: {0}")]
    Unavailable(String),
}

/// The service that changes the real pointer and button state.
///
/// Implementations are process-wide and shared between plugin instances,
/// so every method takes `&self`.
#[cfg_attr(test, mockall::automock)]
pub trait InputEffector: Send + Sync {
    fn move_to(&self, point: Point) -> Result<(), EffectorError>;

    fn move_by(&self, offset: Point) -> Result<(), EffectorError>;

    fn horizontal_scroll(&self, amount: i32) -> Result<(), EffectorError>;

    fn vertical_scroll(&self, amount: i32) -> Result<(), EffectorError>;

    fn button_click(&self, button: MouseButton) -> Result<(), EffectorError>;

    fn button_double_click(&self, button: MouseButton) -> Result<(), EffectorError>;

    fn button_down(&self, button: MouseButton) -> Result<(), EffectorError>;

    fn button_up(&self, button: MouseButton) -> Result<(), EffectorError>;
}

/// One effect performed by a [`TracingEffector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectorCall {
    MoveTo(Point),
    MoveBy(Point),
    HorizontalScroll(i32),
    VerticalScroll(i32),
    Click(MouseButton),
    DoubleClick(MouseButton),
    Down(MouseButton),
    Up(MouseButton),
}

#[derive(Debug, Default)]
struct VirtualPointer {
    position: Point,
    journal: Vec<EffectorCall>,
}

/// Effector that performs nothing on the host system: it logs each effect,
/// tracks a virtual pointer position and keeps a journal of calls.
///
/// Used for dry runs and as the observable effector in tests.
#[derive(Debug, Default)]
pub struct TracingEffector {
    pointer: Mutex<VirtualPointer>,
}

impl TracingEffector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the virtual pointer at `position`.
    pub fn at(position: Point) -> Self {
        Self {
            pointer: Mutex::new(VirtualPointer {
                position,
                journal: Vec::new(),
            }),
        }
    }

    /// Every effect performed so far, oldest first.
    pub fn calls(&self) -> Vec<EffectorCall> {
        self.lock().journal.clone()
    }

    pub fn position(&self) -> Point {
        self.lock().position
    }

    fn lock(&self) -> MutexGuard<'_, VirtualPointer> {
        self.pointer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: EffectorCall) -> Result<(), EffectorError> {
        tracing::info!("Input effect: {:?}", call);
        let mut pointer = self.lock();
        match call {
            EffectorCall::MoveTo(point) => pointer.position = point,
            EffectorCall::MoveBy(offset) => pointer.position = pointer.position.offset(offset),
            _ => {}
        }
        pointer.journal.push(call);
        Ok(())
    }
}

impl InputEffector for TracingEffector {
    fn move_to(&self, point: Point) -> Result<(), EffectorError> {
        self.record(EffectorCall::MoveTo(point))
    }

    fn move_by(&self, offset: Point) -> Result<(), EffectorError> {
        self.record(EffectorCall::MoveBy(offset))
    }

    fn horizontal_scroll(&self, amount: i32) -> Result<(), EffectorError> {
        self.record(EffectorCall::HorizontalScroll(amount))
    }

    fn vertical_scroll(&self, amount: i32) -> Result<(), EffectorError> {
        self.record(EffectorCall::VerticalScroll(amount))
    }

    fn button_click(&self, button: MouseButton) -> Result<(), EffectorError> {
        self.record(EffectorCall::Click(button))
    }

    fn button_double_click(&self, button: MouseButton) -> Result<(), EffectorError> {
        self.record(EffectorCall::DoubleClick(button))
    }

    fn button_down(&self, button: MouseButton) -> Result<(), EffectorError> {
        self.record(EffectorCall::Down(button))
    }

    fn button_up(&self, button: MouseButton) -> Result<(), EffectorError> {
        self.record(EffectorCall::Up(button))
    }
}

/// Everything an action needs to perform its effect.
///
/// Plugin instances built from clones of one context share its effector and
/// its dispatch gate: a gesture holds the gate from pointer relocation to
/// the final settle, so effects of two gestures never interleave.
#[derive(Clone)]
pub struct ActionContext {
    effector: Arc<dyn InputEffector>,
    gate: Arc<Mutex<()>>,
    settle_delay: Duration,
    metrics: Arc<Metrics>,
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("settle_delay", &self.settle_delay)
            .finish_non_exhaustive()
    }
}

impl ActionContext {
    pub fn new(effector: Arc<dyn InputEffector>) -> Self {
        Self {
            effector,
            gate: Arc::new(Mutex::new(())),
            settle_delay: DEFAULT_SETTLE_DELAY,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn effector(&self) -> &dyn InputEffector {
        self.effector.as_ref()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Exclusive use of the effector for one gesture.
    pub fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait out the settle delay after a discrete effect.
    pub fn settle(&self) {
        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }
    }
}
