use crate::events::{Modifiers, RawKeyEvent};
use std::collections::HashSet;

/// Зажатые клавиши и модификаторы текущего жеста
#[derive(Debug, Default)]
pub struct KeyStateTracker {
    pressed: HashSet<String>,
    // Флаги модификаторов последнего keydown; сбрасываются, когда отпущены все модификаторы
    active_gesture: Option<Modifiers>,
}

impl KeyStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_key_down(&mut self, event: &RawKeyEvent) {
        self.pressed.insert(event.token());
        self.active_gesture = Some(event.modifiers());
    }

    /// Возвращает true, если этим отпусканием завершился жест
    pub fn on_key_up(&mut self, event: &RawKeyEvent) -> bool {
        self.pressed.remove(&event.token());

        if event.modifiers().is_empty() {
            return self.active_gesture.take().is_some();
        }

        self.active_gesture = Some(event.modifiers());
        false
    }

    pub fn live_modifiers(&self) -> Modifiers {
        self.active_gesture.unwrap_or_default()
    }

    pub fn is_pressed(&self, token: &str) -> bool {
        self.pressed.contains(token)
    }

    #[cfg(test)]
    pub fn pressed_count(&self) -> usize {
        self.pressed.len()
    }

    /// Сбросить всё состояние (например, при отключении движка)
    pub fn clear(&mut self) {
        self.pressed.clear();
        self.active_gesture = None;
    }
}
