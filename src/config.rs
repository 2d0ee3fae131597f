use crate::services::keyboard::{has_conflict, KeyCombo, TriggerConfig};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub const SEARCH_ENGINES: [&str; 3] = ["google", "duckduckgo", "bing"];
pub const DEFINITION_SOURCES: [&str; 3] = ["dictionary", "wiktionary", "urban"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub timing: TimingConfig,
    pub http: HttpConfig,
    pub navigation: NavigationConfig,
    pub settings: Settings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

/// Временные окна движка
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Сколько ждать продолжения комбинации после нажатия модификатора
    pub debounce_ms: u64,
    /// Подавление повторной отправки после любой отправки
    pub cooldown_ms: u64,
    /// Максимальный возраст выделения для поиска
    pub staleness_ms: u64,
    /// Через сколько скрывать информационное сообщение во всплывающем окне
    pub message_hide_ms: u64,
    pub max_definition_words: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Команда, которой открываются URL (xdg-open, open, ...)
    pub open_command: String,
}

/// Пользовательские настройки в схеме хранилища
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub enabled: bool,
    pub search_engine: String,
    pub trigger_key: String,
    pub open_in_new_tab: bool,
    pub show_notifications: bool,
    pub enable_in_page_definition: bool,
    pub definition_trigger_key: String,
    pub definition_source: String,
}

/// Изменение настроек: присутствуют только изменившиеся ключи
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub search_engine: Option<String>,
    pub trigger_key: Option<String>,
    pub open_in_new_tab: Option<bool>,
    pub show_notifications: Option<bool>,
    pub enable_in_page_definition: Option<bool>,
    pub definition_trigger_key: Option<String>,
    pub definition_source: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            filter: "auto_text_search=info".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            cooldown_ms: 1000,
            staleness_ms: 5000,
            message_hide_ms: 3000,
            max_definition_words: 3,
        }
    }
}

impl TimingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn staleness(&self) -> Duration {
        Duration::from_millis(self.staleness_ms)
    }

    pub fn message_hide(&self) -> Duration {
        Duration::from_millis(self.message_hide_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 8000,
            user_agent: format!("auto-text-search/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            open_command: "xdg-open".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            search_engine: "google".to_string(),
            trigger_key: "alt".to_string(),
            open_in_new_tab: true,
            show_notifications: true,
            enable_in_page_definition: false,
            definition_trigger_key: "ctrl+d".to_string(),
            definition_source: "dictionary".to_string(),
        }
    }
}

impl Settings {
    /// Применить изменения из хранилища. Возвращает true, если что-то поменялось.
    pub fn apply(&mut self, patch: SettingsPatch) -> bool {
        let before = self.clone();

        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(engine) = patch.search_engine {
            self.search_engine = engine;
        }
        if let Some(trigger) = patch.trigger_key {
            self.trigger_key = trigger;
        }
        if let Some(new_tab) = patch.open_in_new_tab {
            self.open_in_new_tab = new_tab;
        }
        if let Some(notifications) = patch.show_notifications {
            self.show_notifications = notifications;
        }
        if let Some(definition) = patch.enable_in_page_definition {
            self.enable_in_page_definition = definition;
        }
        if let Some(trigger) = patch.definition_trigger_key {
            self.definition_trigger_key = trigger;
        }
        if let Some(source) = patch.definition_source {
            self.definition_source = source;
        }

        *self != before
    }

    /// Разобрать триггеры. Конфликтующий триггер определения отключается.
    pub fn trigger_config(&self) -> crate::error::Result<TriggerConfig> {
        let search_trigger = KeyCombo::parse(&self.trigger_key)?;
        let define_trigger = KeyCombo::parse(&self.definition_trigger_key)?;

        let mut define_enabled = self.enable_in_page_definition;
        if define_enabled && has_conflict(&search_trigger, &define_trigger) {
            warn!(
                "Триггер определения '{}' конфликтует с триггером поиска '{}' - определение отключено",
                define_trigger, search_trigger
            );
            define_enabled = false;
        }

        Ok(TriggerConfig {
            search_trigger,
            define_trigger,
            define_enabled,
        })
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("ATS_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "pretty" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация временных окон
        if self.timing.debounce_ms == 0 {
            anyhow::bail!("debounce_ms должно быть больше 0");
        }
        if self.timing.cooldown_ms == 0 {
            anyhow::bail!("cooldown_ms должно быть больше 0");
        }
        if self.timing.staleness_ms < self.timing.debounce_ms {
            anyhow::bail!("staleness_ms не может быть меньше debounce_ms");
        }
        if self.timing.max_definition_words == 0 {
            anyhow::bail!("max_definition_words должно быть больше 0");
        }

        if self.http.timeout_ms < 100 {
            anyhow::bail!("http.timeout_ms должно быть минимум 100");
        }

        if self.navigation.open_command.trim().is_empty() {
            anyhow::bail!("navigation.open_command не может быть пустым");
        }

        // Неизвестные ключи допустимы: при построении URL они заменяются значениями по умолчанию
        if !SEARCH_ENGINES.contains(&self.settings.search_engine.as_str()) {
            warn!(
                "Неизвестная поисковая система '{}', будет использована google",
                self.settings.search_engine
            );
        }
        if !DEFINITION_SOURCES.contains(&self.settings.definition_source.as_str()) {
            warn!(
                "Неизвестный источник определений '{}', будет использован dictionary",
                self.settings.definition_source
            );
        }

        self.settings
            .trigger_config()
            .context("Неверный триггер в настройках")?;

        Ok(())
    }
}
