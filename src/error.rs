use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtsError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Источник вернул статус {status} для {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Некорректный JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Источник '{0}' не вернул ни одного определения")]
    NoDefinitions(String),

    #[error("Неверная комбинация клавиш: {0}")]
    InvalidCombo(String),

    #[error("Канал закрыт: {0}")]
    Channel(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),
}

impl AtsError {
    pub fn invalid_combo<T>(msg: impl Into<String>) -> Result<T> {
        Err(AtsError::InvalidCombo(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, AtsError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! ats_error {
    (channel, $($arg:tt)*) => {
        $crate::error::AtsError::Channel(format!($($arg)*))
    };
    (invalid_combo, $($arg:tt)*) => {
        $crate::error::AtsError::InvalidCombo(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::AtsError::ServiceUnavailable(format!($($arg)*))
    };
}
