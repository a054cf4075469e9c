use super::settings::MouseAction;
use crate::services::{EffectorError, InputEffector, MouseButton};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A pointer operation bound to one [`MouseAction`].
pub type PointerOperation =
    Arc<dyn Fn(&dyn InputEffector) -> Result<(), EffectorError> + Send + Sync>;

/// Lookup from button actions to the operation performing them.
///
/// Built once at startup and shared read-only between plugin instances.
#[derive(Clone, Default)]
pub struct OperationTable {
    operations: HashMap<MouseAction, PointerOperation>,
}

impl fmt::Debug for OperationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<_> = self.operations.keys().map(MouseAction::name).collect();
        actions.sort_unstable();
        f.debug_struct("OperationTable").field("actions", &actions).finish()
    }
}

impl OperationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with click, double-click, down and up for the left, right and
    /// middle buttons.
    pub fn standard() -> Self {
        let mut table = Self::new();
        let primary = MouseAction::ALL.into_iter().filter_map(|action| match action.button_effect() {
            Some((button @ (MouseButton::Left | MouseButton::Right | MouseButton::Middle), effect)) => {
                Some((action, button, effect))
            }
            _ => None,
        });
        for (action, button, effect) in primary {
            table.register(action, move |effector: &dyn InputEffector| {
                effect.apply(effector, button)
            });
        }
        table
    }

    pub fn register<F>(&mut self, action: MouseAction, operation: F)
    where
        F: Fn(&dyn InputEffector) -> Result<(), EffectorError> + Send + Sync + 'static,
    {
        self.operations.insert(action, Arc::new(operation));
    }

    pub fn get(&self, action: MouseAction) -> Option<&PointerOperation> {
        self.operations.get(&action)
    }

    pub fn contains(&self, action: MouseAction) -> bool {
        self.operations.contains_key(&action)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
