use crate::events::RawKeyEvent;
use crate::services::dispatcher::ActionKind;
use crate::services::timers::{TimerQueue, TimerToken};
use std::time::Duration;
use tokio::time::Instant;

use super::combo::{is_combo_active, TriggerConfig};
use super::key_state::KeyStateTracker;

/// Что делать с только что нажатой клавишей
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Решение отложено до срабатывания таймера `TimerToken::Debounce`
    Deferred,
    /// Разрешить триггер сразу
    ResolveNow,
}

/// Откладывает неоднозначные нажатия модификаторов, пока комбинация может ещё вырасти
#[derive(Debug, Clone)]
pub struct DebounceGate {
    window: Duration,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Любое нажатие отменяет ожидающий таймер и принимает решение заново
    pub fn on_key_down(
        &self,
        event: &RawKeyEvent,
        triggers: &TriggerConfig,
        timers: &mut TimerQueue,
        now: Instant,
    ) -> GateDecision {
        timers.cancel(TimerToken::Debounce);

        if might_form_larger_combo(event, triggers) {
            timers.schedule_once(now, self.window, TimerToken::Debounce);
            GateDecision::Deferred
        } else {
            GateDecision::ResolveNow
        }
    }

    /// Разрешение по текущему состоянию клавиш: сначала определение, затем поиск
    pub fn resolve(triggers: &TriggerConfig, keys: &KeyStateTracker) -> Option<ActionKind> {
        if triggers.define_enabled && is_combo_active(&triggers.define_trigger, keys) {
            return Some(ActionKind::Define);
        }

        if is_combo_active(&triggers.search_trigger, keys) && !is_forming_define(triggers, keys) {
            return Some(ActionKind::Search);
        }

        None
    }
}

/// Нажатый модификатор может оказаться началом более длинной комбинации
pub fn might_form_larger_combo(event: &RawKeyEvent, triggers: &TriggerConfig) -> bool {
    if !triggers.define_enabled || !triggers.has_combination() {
        return false;
    }

    let Some(modifier) = event.modifier_key() else {
        return false;
    };

    [&triggers.search_trigger, &triggers.define_trigger]
        .into_iter()
        .any(|combo| combo.is_combination() && combo.modifiers().contains(modifier))
}

// Зажатые модификаторы целиком входят в комбинацию определения - она ещё набирается
fn is_forming_define(triggers: &TriggerConfig, keys: &KeyStateTracker) -> bool {
    if !triggers.define_enabled || !triggers.define_trigger.is_combination() {
        return false;
    }

    let held = keys.live_modifiers();
    !held.is_empty() && held.is_subset_of(&triggers.define_trigger.modifiers())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Modifier, Modifiers};
    use crate::services::keyboard::KeyCombo;

    fn triggers(search: &str, define: &str, define_enabled: bool) -> TriggerConfig {
        TriggerConfig {
            search_trigger: KeyCombo::parse(search).unwrap(),
            define_trigger: KeyCombo::parse(define).unwrap(),
            define_enabled,
        }
    }

    fn down(key: &str, modifiers: Modifiers) -> RawKeyEvent {
        RawKeyEvent::new(key).with_modifiers(modifiers)
    }

    #[test]
    fn test_modifier_of_define_combo_is_deferred() {
        let config = triggers("alt", "ctrl+d", true);
        let ctrl = Modifiers::new().with(Modifier::Ctrl);

        assert!(might_form_larger_combo(&down("Control", ctrl), &config));
        assert!(!might_form_larger_combo(
            &down("Alt", Modifiers::new().with(Modifier::Alt)),
            &config
        ));
        // Обычная клавиша никогда не откладывается
        assert!(!might_form_larger_combo(&down("d", ctrl), &config));
        // Без определения откладывать нечего
        assert!(!might_form_larger_combo(
            &down("Control", ctrl),
            &triggers("alt", "ctrl+d", false)
        ));
        // Нет ни одной составной комбинации
        assert!(!might_form_larger_combo(
            &down("Control", ctrl),
            &triggers("alt", "ctrl", true)
        ));
    }

    #[test]
    fn test_gate_schedules_and_cancels_debounce() {
        let gate = DebounceGate::new(Duration::from_millis(100));
        let config = triggers("alt", "ctrl+d", true);
        let ctrl = Modifiers::new().with(Modifier::Ctrl);
        let mut timers = TimerQueue::new();
        let t0 = Instant::now();

        assert_eq!(
            gate.on_key_down(&down("Control", ctrl), &config, &mut timers, t0),
            GateDecision::Deferred
        );
        assert!(timers.is_pending(TimerToken::Debounce));

        assert_eq!(
            gate.on_key_down(&down("d", ctrl), &config, &mut timers, t0 + Duration::from_millis(30)),
            GateDecision::ResolveNow
        );
        assert!(!timers.is_pending(TimerToken::Debounce));
    }

    #[test]
    fn test_resolve_prefers_define() {
        let config = triggers("alt", "ctrl+d", true);
        let ctrl = Modifiers::new().with(Modifier::Ctrl);
        let mut keys = KeyStateTracker::new();

        keys.on_key_down(&down("Control", ctrl));
        assert_eq!(DebounceGate::resolve(&config, &keys), None);

        keys.on_key_down(&down("d", ctrl));
        assert_eq!(DebounceGate::resolve(&config, &keys), Some(ActionKind::Define));
    }

    #[test]
    fn test_search_suppressed_while_define_is_forming() {
        // Поиск по ctrl+shift, определение ctrl+shift+d: ctrl+shift ещё может стать определением
        let config = triggers("ctrl+shift", "ctrl+shift+d", true);
        let ctrl_shift = Modifiers::new().with(Modifier::Ctrl).with(Modifier::Shift);
        let mut keys = KeyStateTracker::new();
        keys.on_key_down(&down("Control", Modifiers::new().with(Modifier::Ctrl)));
        keys.on_key_down(&down("Shift", ctrl_shift));

        assert_eq!(DebounceGate::resolve(&config, &keys), None);

        let without_define = triggers("ctrl+shift", "ctrl+shift+d", false);
        assert_eq!(
            DebounceGate::resolve(&without_define, &keys),
            Some(ActionKind::Search)
        );
    }

    #[test]
    fn test_resolve_search_with_define_enabled() {
        let config = triggers("alt", "ctrl+d", true);
        let mut keys = KeyStateTracker::new();
        keys.on_key_down(&down("Alt", Modifiers::new().with(Modifier::Alt)));

        assert_eq!(DebounceGate::resolve(&config, &keys), Some(ActionKind::Search));
    }
}
