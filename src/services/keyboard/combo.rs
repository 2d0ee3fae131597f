use crate::error::{AtsError, Result};
use crate::events::{Modifier, Modifiers};
use smallvec::SmallVec;
use std::fmt;

use super::key_state::KeyStateTracker;

/// Комбинация клавиш: модификаторы плюс не более одной обычной клавиши
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    modifiers: Modifiers,
    key: Option<String>,
}

impl KeyCombo {
    /// Разбор строки вида "ctrl+d", "alt", "Shift + D"
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return AtsError::invalid_combo("пустая комбинация");
        }

        let mut modifiers = Modifiers::new();
        let mut key: Option<String> = None;

        for raw in input.split('+') {
            let token = raw.trim().to_lowercase();
            if token.is_empty() {
                return AtsError::invalid_combo(format!("пустой токен в '{input}'"));
            }

            match Modifier::from_token(&token) {
                Some(modifier) => modifiers.insert(modifier),
                None if key.is_none() => key = Some(token),
                None => {
                    return Err(crate::ats_error!(
                        invalid_combo,
                        "в '{}' больше одной обычной клавиши",
                        input
                    ))
                }
            }
        }

        Ok(Self { modifiers, key })
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Комбинация из нескольких клавиш ("ctrl+d", "ctrl+shift")
    pub fn is_combination(&self) -> bool {
        self.modifiers.len() + usize::from(self.key.is_some()) > 1
    }

    pub fn is_modifier_only(&self) -> bool {
        self.key.is_none()
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: SmallVec<[&str; 5]> = self.modifiers.iter().map(|m| m.token()).collect();
        if let Some(key) = &self.key {
            parts.push(key.as_str());
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// Оба триггера в разобранном виде
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerConfig {
    pub search_trigger: KeyCombo,
    pub define_trigger: KeyCombo,
    pub define_enabled: bool,
}

impl TriggerConfig {
    /// Хотя бы один из триггеров состоит из нескольких клавиш
    pub fn has_combination(&self) -> bool {
        self.search_trigger.is_combination() || self.define_trigger.is_combination()
    }
}

/// Точное совпадение: зажаты ровно модификаторы комбинации и её обычная клавиша
pub fn is_combo_active(combo: &KeyCombo, keys: &KeyStateTracker) -> bool {
    if keys.live_modifiers() != combo.modifiers() {
        return false;
    }

    match combo.key() {
        Some(key) => keys.is_pressed(key),
        None => !combo.modifiers().is_empty(),
    }
}

/// Две комбинации конфликтуют, если одна неизбежно срабатывает при наборе другой
pub fn has_conflict(a: &KeyCombo, b: &KeyCombo) -> bool {
    if a == b {
        return true;
    }

    a.modifiers() == b.modifiers() && (a.is_modifier_only() || b.is_modifier_only())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RawKeyEvent;

    fn combo(input: &str) -> KeyCombo {
        KeyCombo::parse(input).expect("valid combo")
    }

    fn held(keys: &[&str]) -> KeyStateTracker {
        let mut modifiers = Modifiers::new();
        let mut tracker = KeyStateTracker::new();
        for key in keys {
            if let Some(modifier) = Modifier::from_dom_key(key) {
                modifiers.insert(modifier);
            }
            tracker.on_key_down(&RawKeyEvent::new(*key).with_modifiers(modifiers));
        }
        tracker
    }

    #[test]
    fn test_parse_combo() {
        let c = combo("Ctrl + Shift + D");
        assert_eq!(c.modifiers(), Modifiers::new().with(Modifier::Ctrl).with(Modifier::Shift));
        assert_eq!(c.key(), Some("d"));
        assert!(c.is_combination());
        assert_eq!(c.to_string(), "ctrl+shift+d");

        let alt = combo("option");
        assert!(alt.is_modifier_only());
        assert!(!alt.is_combination());
        assert_eq!(alt.to_string(), "alt");

        assert!(KeyCombo::parse("").is_err());
        assert!(KeyCombo::parse("ctrl+").is_err());
        assert!(KeyCombo::parse("a+b").is_err());
    }

    #[test]
    fn test_combo_equality_ignores_order() {
        assert_eq!(combo("shift+ctrl+d"), combo("ctrl+shift+d"));
        assert_ne!(combo("ctrl+d"), combo("ctrl+e"));
    }

    #[test]
    fn test_conflict_rules() {
        assert!(has_conflict(&combo("ctrl+d"), &combo("ctrl+d")));
        assert!(has_conflict(&combo("shift"), &combo("shift+d")));
        assert!(has_conflict(&combo("ctrl+shift+d"), &combo("ctrl+shift")));
        assert!(!has_conflict(&combo("alt"), &combo("ctrl+d")));
        assert!(!has_conflict(&combo("ctrl+d"), &combo("ctrl+e")));
        assert!(!has_conflict(&combo("ctrl"), &combo("ctrl+shift+d")));
    }

    #[test]
    fn test_conflict_for_every_modifier_set_with_one_bare_combo() {
        let modifier_sets = ["ctrl", "shift", "alt", "cmd", "ctrl+shift", "ctrl+alt+cmd"];
        for set in modifier_sets {
            let bare = combo(set);
            let with_key = combo(&format!("{set}+k"));
            assert!(has_conflict(&bare, &with_key), "{set}");
            assert!(has_conflict(&with_key, &bare), "{set}");
        }
    }

    #[test]
    fn test_exact_match_for_modifier_only() {
        let ctrl = combo("ctrl");
        assert!(is_combo_active(&ctrl, &held(&["Control"])));
        assert!(!is_combo_active(&ctrl, &held(&["Control", "Shift"])));
        assert!(!is_combo_active(&ctrl, &held(&["Alt"])));
    }

    #[test]
    fn test_exact_match_with_key() {
        let ctrl_d = combo("ctrl+d");
        assert!(is_combo_active(&ctrl_d, &held(&["Control", "d"])));
        assert!(!is_combo_active(&ctrl_d, &held(&["Control"])));
        assert!(!is_combo_active(&ctrl_d, &held(&["Control", "Shift", "d"])));
        assert!(!is_combo_active(&ctrl_d, &held(&["d"])));

        // Одиночная обычная клавиша требует отсутствия модификаторов
        let plain = combo("q");
        assert!(is_combo_active(&plain, &held(&["q"])));
        assert!(!is_combo_active(&plain, &held(&["Shift", "q"])));
    }
}
