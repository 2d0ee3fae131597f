use crate::config::SettingsPatch;
use crate::events::{ContentMessage, RawKeyEvent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Событие страницы, поступающее в движок
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageEvent {
    #[serde(rename = "keydown")]
    KeyDown(RawKeyEvent),

    #[serde(rename = "keyup")]
    KeyUp(RawKeyEvent),

    #[serde(rename = "selectionchange")]
    SelectionChange { text: String },

    /// Клик по странице; клик вне всплывающего окна закрывает его
    #[serde(rename = "click", rename_all = "camelCase")]
    Click {
        #[serde(default)]
        inside_popup: bool,
    },

    /// Ссылка "Search full definition" во всплывающем окне
    #[serde(rename = "searchMore")]
    SearchMore,

    /// Уведомление хранилища об изменении настроек
    #[serde(rename = "storageChanged")]
    SettingsChanged(SettingsPatch),

    /// Ответ фоновой части (приходит по каналу вкладки, не со страницы)
    #[serde(skip)]
    Message(ContentMessage),
}

impl fmt::Display for PageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageEvent::KeyDown(event) => write!(f, "keydown {event}"),
            PageEvent::KeyUp(event) => write!(f, "keyup {event}"),
            PageEvent::SelectionChange { text } => write!(f, "selectionchange {text:?}"),
            PageEvent::Click { inside_popup } => write!(f, "click (inside_popup: {inside_popup})"),
            PageEvent::SearchMore => write!(f, "searchMore"),
            PageEvent::SettingsChanged(_) => write!(f, "storageChanged"),
            PageEvent::Message(ContentMessage::ShowDefinition { data }) => {
                write!(f, "showDefinition {:?}", data.word)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitTag {
    Wait,
}

/// Строка входного потока хоста: событие страницы или пауза воспроизведения
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InputLine {
    Wait {
        #[allow(dead_code)]
        #[serde(rename = "type")]
        tag: WaitTag,
        ms: u64,
    },
    Event(PageEvent),
}

impl InputLine {
    /// Пустые строки и строки-комментарии (`#`) пропускаются
    pub fn parse(line: &str) -> Option<serde_json::Result<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        Some(serde_json::from_str(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_events_from_json() {
        let down: PageEvent =
            serde_json::from_str(r#"{"type":"keydown","key":"Alt","altKey":true}"#).unwrap();
        assert!(matches!(down, PageEvent::KeyDown(ref e) if e.alt_key && e.key == "Alt"));

        let selection: PageEvent =
            serde_json::from_str(r#"{"type":"selectionchange","text":" hello "}"#).unwrap();
        assert_eq!(
            selection,
            PageEvent::SelectionChange {
                text: " hello ".to_string()
            }
        );

        let click: PageEvent = serde_json::from_str(r#"{"type":"click"}"#).unwrap();
        assert_eq!(click, PageEvent::Click { inside_popup: false });

        let patch: PageEvent =
            serde_json::from_str(r#"{"type":"storageChanged","searchEngine":"bing"}"#).unwrap();
        assert!(
            matches!(patch, PageEvent::SettingsChanged(ref p) if p.search_engine.as_deref() == Some("bing"))
        );
    }

    #[test]
    fn test_input_lines() {
        assert!(InputLine::parse("   ").is_none());
        assert!(InputLine::parse("# alt search").is_none());

        let wait = InputLine::parse(r#"{"type":"wait","ms":250}"#).unwrap().unwrap();
        assert_eq!(
            wait,
            InputLine::Wait {
                tag: WaitTag::Wait,
                ms: 250
            }
        );

        let event = InputLine::parse(r#"{"type":"searchMore"}"#).unwrap().unwrap();
        assert_eq!(event, InputLine::Event(PageEvent::SearchMore));

        assert!(InputLine::parse(r#"{"type":"scroll"}"#).unwrap().is_err());
    }
}
