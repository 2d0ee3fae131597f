use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор вкладки, которой принадлежит экземпляр движка
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// Одно значение слова
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub part_of_speech: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Нормализованный результат поиска определения
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionResult {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DefinitionResult {
    pub const NOT_FOUND: &'static str = "Definition not found";

    pub fn found(word: impl Into<String>, phonetic: Option<String>, meanings: Vec<Meaning>) -> Self {
        Self {
            word: word.into(),
            phonetic,
            meanings,
            error: None,
        }
    }

    pub fn failed(word: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            phonetic: None,
            meanings: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn not_found(word: impl Into<String>) -> Self {
        Self::failed(word, Self::NOT_FOUND)
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Запросы движка страницы к фоновой части
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BackgroundRequest {
    #[serde(rename_all = "camelCase")]
    Search {
        text: String,
        search_engine: String,
        open_in_new_tab: bool,
    },
    #[serde(rename_all = "camelCase")]
    GetDefinition { text: String, source: String },
}

impl fmt::Display for BackgroundRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackgroundRequest::Search { text, search_engine, .. } => {
                write!(f, "search({search_engine}: {text:?})")
            }
            BackgroundRequest::GetDefinition { text, source } => {
                write!(f, "getDefinition({source}: {text:?})")
            }
        }
    }
}

/// Сообщения фоновой части движку страницы
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContentMessage {
    ShowDefinition { data: DefinitionResult },
}
