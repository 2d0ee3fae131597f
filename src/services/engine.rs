use crate::config::{Settings, SettingsPatch, TimingConfig};
use crate::error::Result;
use crate::events::{BackgroundRequest, ContentMessage, PageEvent, RawKeyEvent, TabId};
use crate::services::backend::BackgroundEnvelope;
use crate::services::dispatcher::{ActionDispatcher, ActionKind, DispatchAction};
use crate::services::keyboard::{DebounceGate, GateDecision, KeyStateTracker, TriggerConfig};
use crate::services::popup::{search_feedback, Popup, PopupRenderer, PopupView, TOO_MANY_WORDS_MESSAGE};
use crate::services::selection::{SelectionChange, SelectionTracker};
use crate::services::timers::{TimerQueue, TimerToken};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::debug_if_enabled;

/// Побочный эффект обработки события
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send(BackgroundRequest),
    Render(PopupView),
    Feedback(String),
}

/// Движок одной страницы: владеет всем состоянием от клавиш до всплывающего окна
pub struct ContentEngine {
    settings: Settings,
    triggers: TriggerConfig,
    timing: TimingConfig,
    keys: KeyStateTracker,
    gate: DebounceGate,
    selection: SelectionTracker,
    dispatcher: ActionDispatcher,
    timers: TimerQueue,
    popup: Popup,
}

impl ContentEngine {
    pub fn new(settings: Settings, timing: &TimingConfig) -> Result<Self> {
        let triggers = settings.trigger_config()?;
        info!(
            "Триггер поиска: {}, триггер определения: {} (включён: {})",
            triggers.search_trigger, triggers.define_trigger, triggers.define_enabled
        );

        Ok(Self {
            settings,
            triggers,
            timing: timing.clone(),
            keys: KeyStateTracker::new(),
            gate: DebounceGate::new(timing.debounce()),
            selection: SelectionTracker::new(),
            dispatcher: ActionDispatcher::new(timing),
            timers: TimerQueue::new(),
            popup: Popup::new(),
        })
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn handle_event(&mut self, event: PageEvent, now: Instant) -> Vec<Effect> {
        debug_if_enabled!("Событие страницы: {}", event);
        let mut effects = Vec::new();

        match event {
            PageEvent::KeyDown(_) | PageEvent::KeyUp(_) | PageEvent::SelectionChange { .. }
                if !self.settings.enabled => {}
            PageEvent::KeyDown(key) => self.on_key_down(&key, now, &mut effects),
            PageEvent::KeyUp(key) => {
                if self.keys.on_key_up(&key) {
                    self.selection.rearm();
                }
            }
            PageEvent::SelectionChange { text } => {
                if self.selection.on_selection_change(&text, now) == SelectionChange::Cleared {
                    self.timers.cancel(TimerToken::Debounce);
                    self.hide_popup(&mut effects);
                }
            }
            PageEvent::Click { inside_popup } => {
                if !inside_popup {
                    self.hide_popup(&mut effects);
                }
            }
            PageEvent::SearchMore => self.on_search_more(now, &mut effects),
            PageEvent::SettingsChanged(patch) => self.on_settings_changed(patch),
            PageEvent::Message(ContentMessage::ShowDefinition { data }) => {
                let word = data.word.clone();
                if self.popup.show_definition(data) {
                    effects.push(Effect::Render(self.popup.view().clone()));
                } else {
                    debug_if_enabled!("Определение {:?} уже не ожидается - отброшено", word);
                }
            }
        }

        effects
    }

    /// Обработать сработавшие к `now` таймеры
    pub fn on_timers(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();

        for token in self.timers.pop_expired(now) {
            match token {
                TimerToken::Debounce => self.resolve_trigger(now, &mut effects),
                TimerToken::Cooldown => self.dispatcher.on_cooldown_elapsed(),
                TimerToken::HideMessage => {
                    if matches!(self.popup.view(), PopupView::Message(_)) {
                        self.hide_popup(&mut effects);
                    }
                }
            }
        }

        effects
    }

    fn on_key_down(&mut self, key: &RawKeyEvent, now: Instant, effects: &mut Vec<Effect>) {
        self.keys.on_key_down(key);

        match self.gate.on_key_down(key, &self.triggers, &mut self.timers, now) {
            GateDecision::Deferred => {
                debug_if_enabled!("{} может быть началом комбинации - ждём", key);
            }
            GateDecision::ResolveNow => self.resolve_trigger(now, effects),
        }
    }

    fn resolve_trigger(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        let Some(kind) = DebounceGate::resolve(&self.triggers, &self.keys) else {
            return;
        };

        let result = self.dispatcher.dispatch(
            kind,
            &mut self.selection,
            &self.settings,
            &mut self.timers,
            now,
        );

        match result {
            Ok(action) => self.apply_action(action, now, effects),
            Err(e) => debug_if_enabled!("Отправка {} пропущена: {}", kind, e),
        }
    }

    fn on_search_more(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        let Some(word) = self.popup.shown_word().map(str::to_string) else {
            return;
        };
        self.hide_popup(effects);

        match self
            .dispatcher
            .dispatch_text(&word, &self.settings, &mut self.timers, now)
        {
            Ok(action) => self.apply_action(action, now, effects),
            Err(e) => debug_if_enabled!("Отправка {} пропущена: {}", ActionKind::Search, e),
        }
    }

    fn apply_action(&mut self, action: DispatchAction, now: Instant, effects: &mut Vec<Effect>) {
        match action {
            DispatchAction::Send(request) => {
                let follow_up = match &request {
                    BackgroundRequest::Search { text, .. } => self
                        .settings
                        .show_notifications
                        .then(|| Effect::Feedback(search_feedback(text))),
                    BackgroundRequest::GetDefinition { text, .. } => {
                        self.timers.cancel(TimerToken::HideMessage);
                        self.popup.show_loading(text);
                        Some(Effect::Render(self.popup.view().clone()))
                    }
                };
                effects.push(Effect::Send(request));
                effects.extend(follow_up);
            }
            DispatchAction::TooManyWords => {
                self.popup.show_message(TOO_MANY_WORDS_MESSAGE);
                self.timers
                    .schedule_once(now, self.timing.message_hide(), TimerToken::HideMessage);
                effects.push(Effect::Render(self.popup.view().clone()));
            }
        }
    }

    fn on_settings_changed(&mut self, patch: SettingsPatch) {
        if !self.settings.apply(patch) {
            return;
        }

        match self.settings.trigger_config() {
            Ok(triggers) => {
                info!(
                    "Настройки обновлены: поиск {}, определение {} (включено: {})",
                    triggers.search_trigger, triggers.define_trigger, triggers.define_enabled
                );
                self.triggers = triggers;
            }
            Err(e) => warn!("Неверный триггер в новых настройках, оставляем прежние: {}", e),
        }

        if !self.settings.enabled {
            self.keys.clear();
            self.timers.cancel(TimerToken::Debounce);
        }
    }

    fn hide_popup(&mut self, effects: &mut Vec<Effect>) {
        self.timers.cancel(TimerToken::HideMessage);
        if self.popup.hide() {
            effects.push(Effect::Render(PopupView::Hidden));
        }
    }
}

/// Запущенный экземпляр движка страницы
pub struct EngineHandle {
    tab: TabId,
    events: mpsc::UnboundedSender<PageEvent>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Запустить движок вкладки; эффекты уходят в фоновую часть и в отрисовку
    pub fn spawn(
        tab: TabId,
        engine: ContentEngine,
        backend: mpsc::UnboundedSender<BackgroundEnvelope>,
        renderer: Box<dyn PopupRenderer>,
    ) -> Self {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run_engine(tab, engine, events_rx, shutdown_rx, backend, renderer));
        info!("Движок вкладки {} запущен", tab);

        Self {
            tab,
            events,
            shutdown,
            task,
        }
    }

    /// Канал событий движка (для регистрации во фоновой части)
    pub fn sender(&self) -> mpsc::UnboundedSender<PageEvent> {
        self.events.clone()
    }

    pub fn send(&self, event: PageEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| crate::ats_error!(channel, "движок вкладки {} остановлен", self.tab))
    }

    /// Остановить движок и дождаться завершения его задачи
    pub async fn dispose(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            warn!("Задача движка вкладки {} завершилась с ошибкой: {}", self.tab, e);
        }
        info!("Движок вкладки {} остановлен", self.tab);
    }
}

async fn run_engine(
    tab: TabId,
    mut engine: ContentEngine,
    mut events: mpsc::UnboundedReceiver<PageEvent>,
    mut shutdown: oneshot::Receiver<()>,
    backend: mpsc::UnboundedSender<BackgroundEnvelope>,
    mut renderer: Box<dyn PopupRenderer>,
) {
    loop {
        let deadline = engine.next_deadline();

        let effects = tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Some(event) => engine.handle_event(event, Instant::now()),
                None => break,
            },
            _ = sleep_until(deadline) => engine.on_timers(Instant::now()),
        };

        for effect in effects {
            match effect {
                Effect::Send(request) => {
                    if backend.send((tab, request)).is_err() {
                        warn!("Фоновая часть недоступна, запрос вкладки {} потерян", tab);
                    }
                }
                Effect::Render(view) => renderer.render(&view),
                Effect::Feedback(text) => renderer.feedback(&text),
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
