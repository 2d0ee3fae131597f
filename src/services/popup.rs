use crate::events::DefinitionResult;
use std::io::Write;

pub const TOO_MANY_WORDS_MESSAGE: &str =
    "Please select a single word or short phrase for definition.";
pub const SEARCH_MORE_LABEL: &str = "Search full definition →";

// Во всплывающем окне показываются только первые значения
const MEANINGS_SHOWN: usize = 2;
const FEEDBACK_PREVIEW_CHARS: usize = 30;

/// Полное содержимое всплывающего окна. Окно всегда заменяется целиком.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PopupView {
    #[default]
    Hidden,
    Loading {
        word: String,
    },
    Message(String),
    Definition(DefinitionResult),
}

/// Единственное всплывающее окно страницы
#[derive(Debug, Default)]
pub struct Popup {
    view: PopupView,
}

impl Popup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &PopupView {
        &self.view
    }

    pub fn show_loading(&mut self, word: &str) {
        self.view = PopupView::Loading {
            word: word.to_string(),
        };
    }

    pub fn show_message(&mut self, message: &str) {
        self.view = PopupView::Message(message.to_string());
    }

    /// Показать ответ. Принимается только ответ на слово, которое сейчас загружается.
    pub fn show_definition(&mut self, result: DefinitionResult) -> bool {
        let PopupView::Loading { word } = &self.view else {
            return false;
        };
        if !same_word(word, &result.word) {
            return false;
        }
        self.view = PopupView::Definition(result);
        true
    }

    /// Возвращает true, если окно было видно
    pub fn hide(&mut self) -> bool {
        std::mem::take(&mut self.view) != PopupView::Hidden
    }

    /// Слово показанного определения (для ссылки "Search full definition")
    pub fn shown_word(&self) -> Option<&str> {
        match &self.view {
            PopupView::Definition(result) if !result.is_error() => Some(&result.word),
            _ => None,
        }
    }
}

/// Граница отрисовки всплывающего окна и уведомлений
pub trait PopupRenderer: Send {
    fn render(&mut self, view: &PopupView);
    fn feedback(&mut self, text: &str);
}

/// Отрисовка в терминал
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> PopupRenderer for TerminalRenderer<W> {
    fn render(&mut self, view: &PopupView) {
        let lines = render_lines(view);
        let result = if lines.is_empty() {
            writeln!(self.out, "[popup hidden]")
        } else {
            lines
                .iter()
                .try_for_each(|line| writeln!(self.out, "│ {line}"))
        };
        if let Err(e) = result.and_then(|_| self.out.flush()) {
            tracing::warn!("Не удалось вывести всплывающее окно: {}", e);
        }
    }

    fn feedback(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "» {text}") {
            tracing::warn!("Не удалось вывести уведомление: {}", e);
        }
    }
}

pub fn render_lines(view: &PopupView) -> Vec<String> {
    match view {
        PopupView::Hidden => Vec::new(),
        PopupView::Loading { .. } => vec!["⚙ Loading definition...".to_string()],
        PopupView::Message(message) => vec![message.clone()],
        PopupView::Definition(result) => {
            if let Some(error) = &result.error {
                return vec![format!("Error: {error}")];
            }

            let mut lines = vec![result.word.clone()];
            if let Some(phonetic) = &result.phonetic {
                lines.push(phonetic.clone());
            }
            for meaning in result.meanings.iter().take(MEANINGS_SHOWN) {
                lines.push(capitalize(&meaning.part_of_speech));
                lines.push(format!("  {}", meaning.definition));
                if let Some(example) = &meaning.example {
                    lines.push(format!("  \"{example}\""));
                }
            }
            lines.push(SEARCH_MORE_LABEL.to_string());
            lines
        }
    }
}

/// Текст уведомления о поиске: первые 30 символов запроса
pub fn search_feedback(text: &str) -> String {
    let preview: String = text.chars().take(FEEDBACK_PREVIEW_CHARS).collect();
    let ellipsis = if text.chars().count() > FEEDBACK_PREVIEW_CHARS {
        "..."
    } else {
        ""
    };
    format!("Searching: \"{preview}{ellipsis}\"")
}

fn same_word(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
