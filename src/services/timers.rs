//! Однократные отменяемые таймеры движка.
//!
//! Очередь не запускает задач сама: владелец спрашивает `next_deadline()`,
//! ждёт до этого момента и забирает сработавшие токены через `pop_expired()`.
//! Поэтому тесты управляют временем, просто передавая нужный `Instant`.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::trace_if_enabled;

/// Назначение таймера. На каждый токен существует не более одного таймера.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerToken {
    /// Ожидание продолжения комбинации клавиш
    Debounce,
    /// Окончание окна подавления повторной отправки
    Cooldown,
    /// Автоскрытие информационного сообщения во всплывающем окне
    HideMessage,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    deadlines: HashMap<TimerToken, Instant>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Запланировать (или перезапланировать) таймер
    pub fn schedule_once(&mut self, now: Instant, delay: Duration, token: TimerToken) {
        let deadline = now + delay;
        trace_if_enabled!("timer_schedule {:?} через {}мс", token, delay.as_millis());
        self.deadlines.insert(token, deadline);
    }

    /// Отменить таймер. Возвращает true, если он был запланирован.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let cancelled = self.deadlines.remove(&token).is_some();
        if cancelled {
            trace_if_enabled!("timer_cancel {:?}", token);
        }
        cancelled
    }

    #[cfg(test)]
    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.deadlines.contains_key(&token)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Забрать все сработавшие к `now` таймеры в порядке их сроков
    pub fn pop_expired(&mut self, now: Instant) -> Vec<TimerToken> {
        let mut expired: Vec<(Instant, TimerToken)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(token, deadline)| (*deadline, *token))
            .collect();
        expired.sort_by_key(|(deadline, _)| *deadline);

        for (_, token) in &expired {
            self.deadlines.remove(token);
        }

        expired.into_iter().map(|(_, token)| token).collect()
    }
}
