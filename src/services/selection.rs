use std::time::Duration;
use tokio::time::Instant;

use crate::debug_if_enabled;

/// Последнее непустое выделение и момент, когда оно было захвачено
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSelection {
    pub text: String,
    pub captured_at: Instant,
}

impl PendingSelection {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.captured_at)
    }

    pub fn is_stale(&self, now: Instant, limit: Duration) -> bool {
        self.age(now) > limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Captured,
    Unchanged,
    Cleared,
}

/// Хранит самое свежее выделение для диспетчера; сам ничего не отправляет.
///
/// Выделение потребляется не более одного раза за жест: отправка помечает его
/// использованным, завершение жеста снова делает доступным.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: Option<PendingSelection>,
    consumed: bool,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_selection_change(&mut self, text: &str, now: Instant) -> SelectionChange {
        let text = text.trim();

        if text.is_empty() {
            let had_selection = self.current.take().is_some();
            self.consumed = false;
            return if had_selection {
                debug_if_enabled!("Выделение сброшено");
                SelectionChange::Cleared
            } else {
                SelectionChange::Unchanged
            };
        }

        if self.current.as_ref().is_some_and(|s| s.text == text) {
            return SelectionChange::Unchanged;
        }

        debug_if_enabled!("Захвачено выделение: {:?}", text);
        self.current = Some(PendingSelection {
            text: text.to_string(),
            captured_at: now,
        });
        self.consumed = false;
        SelectionChange::Captured
    }

    /// Выделение, доступное для отправки в текущем жесте
    pub fn pending(&self) -> Option<&PendingSelection> {
        if self.consumed {
            None
        } else {
            self.current.as_ref()
        }
    }

    /// Последнее выделение независимо от того, использовано ли оно
    #[cfg(test)]
    pub fn current(&self) -> Option<&PendingSelection> {
        self.current.as_ref()
    }

    /// Забрать выделение для отправки; до конца жеста оно больше недоступно
    pub fn consume(&mut self) -> Option<PendingSelection> {
        let selection = self.pending().cloned();
        if selection.is_some() {
            self.consumed = true;
        }
        selection
    }

    /// Жест завершён - выделение снова можно использовать
    pub fn rearm(&mut self) {
        self.consumed = false;
    }

    /// Устаревшее выделение отбрасывается целиком
    pub fn discard(&mut self) {
        self.current = None;
        self.consumed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_only_on_change() {
        let t0 = Instant::now();
        let mut tracker = SelectionTracker::new();

        assert_eq!(tracker.on_selection_change("  hello ", t0), SelectionChange::Captured);
        assert_eq!(
            tracker.on_selection_change("hello", t0 + Duration::from_millis(500)),
            SelectionChange::Unchanged
        );
        // Время захвата не обновляется для того же текста
        assert_eq!(tracker.pending().unwrap().captured_at, t0);

        assert_eq!(
            tracker.on_selection_change("hello world", t0 + Duration::from_millis(600)),
            SelectionChange::Captured
        );
        assert_eq!(tracker.pending().unwrap().text, "hello world");
    }

    #[test]
    fn test_clear_selection() {
        let t0 = Instant::now();
        let mut tracker = SelectionTracker::new();

        assert_eq!(tracker.on_selection_change("", t0), SelectionChange::Unchanged);
        tracker.on_selection_change("word", t0);
        assert_eq!(tracker.on_selection_change("   ", t0), SelectionChange::Cleared);
        assert!(tracker.pending().is_none());
    }

    #[test]
    fn test_consume_once_per_gesture() {
        let t0 = Instant::now();
        let mut tracker = SelectionTracker::new();
        tracker.on_selection_change("word", t0);

        assert_eq!(tracker.consume().unwrap().text, "word");
        assert!(tracker.consume().is_none());
        assert!(tracker.current().is_some());

        tracker.rearm();
        assert_eq!(tracker.consume().unwrap().text, "word");
    }

    #[test]
    fn test_staleness() {
        let t0 = Instant::now();
        let selection = PendingSelection {
            text: "word".to_string(),
            captured_at: t0,
        };
        let limit = Duration::from_millis(5000);

        assert!(!selection.is_stale(t0 + Duration::from_millis(5000), limit));
        assert!(selection.is_stale(t0 + Duration::from_millis(5001), limit));
    }
}
