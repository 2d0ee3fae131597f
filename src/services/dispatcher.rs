use crate::config::{Settings, TimingConfig};
use crate::events::BackgroundRequest;
use crate::services::selection::SelectionTracker;
use crate::services::timers::{TimerQueue, TimerToken};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Search,
    Define,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Search => write!(f, "search"),
            ActionKind::Define => write!(f, "define"),
        }
    }
}

/// Ожидаемые гонки событий. Вызывающая сторона молча их игнорирует.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("активно окно подавления повторной отправки")]
    CooldownActive,

    #[error("нет выделения")]
    NoSelection,

    #[error("выделение устарело ({age_ms}мс)")]
    StaleSelection { age_ms: u128 },
}

/// Результат успешной отправки
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchAction {
    Send(BackgroundRequest),
    /// Для определения выделено слишком много слов
    TooManyWords,
}

/// Превращает разрешённый триггер и выделение ровно в одно исходящее действие
#[derive(Debug)]
pub struct ActionDispatcher {
    cooldown: Duration,
    staleness: Duration,
    max_definition_words: usize,
    cooling_down: bool,
}

impl ActionDispatcher {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            cooldown: timing.cooldown(),
            staleness: timing.staleness(),
            max_definition_words: timing.max_definition_words,
            cooling_down: false,
        }
    }

    pub fn dispatch(
        &mut self,
        kind: ActionKind,
        selection: &mut SelectionTracker,
        settings: &Settings,
        timers: &mut TimerQueue,
        now: Instant,
    ) -> Result<DispatchAction, DispatchError> {
        if self.cooling_down {
            return Err(DispatchError::CooldownActive);
        }

        let pending = selection.pending().ok_or(DispatchError::NoSelection)?;

        match kind {
            ActionKind::Search => {
                // Возраст проверяется в момент отправки: между захватом и срабатыванием мог пройти debounce
                if pending.is_stale(now, self.staleness) {
                    let age_ms = pending.age(now).as_millis();
                    selection.discard();
                    return Err(DispatchError::StaleSelection { age_ms });
                }
            }
            ActionKind::Define => {
                if word_count(&pending.text) > self.max_definition_words {
                    return Ok(DispatchAction::TooManyWords);
                }
            }
        }

        let text = selection
            .consume()
            .map(|s| s.text)
            .ok_or(DispatchError::NoSelection)?;

        Ok(self.send(kind, text, settings, timers, now))
    }

    /// Поиск произвольного текста (ссылка "Search full definition"); выделение не используется
    pub fn dispatch_text(
        &mut self,
        text: &str,
        settings: &Settings,
        timers: &mut TimerQueue,
        now: Instant,
    ) -> Result<DispatchAction, DispatchError> {
        if self.cooling_down {
            return Err(DispatchError::CooldownActive);
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(DispatchError::NoSelection);
        }

        Ok(self.send(ActionKind::Search, text.to_string(), settings, timers, now))
    }

    pub fn on_cooldown_elapsed(&mut self) {
        self.cooling_down = false;
    }

    #[cfg(test)]
    pub fn is_cooling_down(&self) -> bool {
        self.cooling_down
    }

    fn send(
        &mut self,
        kind: ActionKind,
        text: String,
        settings: &Settings,
        timers: &mut TimerQueue,
        now: Instant,
    ) -> DispatchAction {
        self.cooling_down = true;
        timers.schedule_once(now, self.cooldown, TimerToken::Cooldown);

        info!("Отправка {}: {:?}", kind, text);

        let request = match kind {
            ActionKind::Search => BackgroundRequest::Search {
                text,
                search_engine: settings.search_engine.clone(),
                open_in_new_tab: settings.open_in_new_tab,
            },
            ActionKind::Define => BackgroundRequest::GetDefinition {
                text,
                source: settings.definition_source.clone(),
            },
        };

        DispatchAction::Send(request)
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
