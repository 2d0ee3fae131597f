use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Клавиша-модификатор
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Cmd,
}

impl Modifier {
    pub const ALL: [Modifier; 4] = [Modifier::Ctrl, Modifier::Shift, Modifier::Alt, Modifier::Cmd];

    /// Каноническое имя токена ("ctrl", "shift", "alt", "cmd")
    pub fn token(self) -> &'static str {
        match self {
            Modifier::Ctrl => "ctrl",
            Modifier::Shift => "shift",
            Modifier::Alt => "alt",
            Modifier::Cmd => "cmd",
        }
    }

    /// Разбор токена с учётом синонимов
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ctrl" | "control" => Some(Modifier::Ctrl),
            "shift" => Some(Modifier::Shift),
            "alt" | "option" | "opt" => Some(Modifier::Alt),
            "cmd" | "meta" | "command" | "super" => Some(Modifier::Cmd),
            _ => None,
        }
    }

    /// Имя клавиши в DOM (`KeyboardEvent.key`) для модификатора
    pub fn from_dom_key(key: &str) -> Option<Self> {
        match key {
            "Control" => Some(Modifier::Ctrl),
            "Shift" => Some(Modifier::Shift),
            "Alt" => Some(Modifier::Alt),
            "Meta" => Some(Modifier::Cmd),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Набор зажатых модификаторов
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub cmd: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(mut self, modifier: Modifier) -> Self {
        self.insert(modifier);
        self
    }

    pub fn insert(&mut self, modifier: Modifier) {
        match modifier {
            Modifier::Ctrl => self.ctrl = true,
            Modifier::Shift => self.shift = true,
            Modifier::Alt => self.alt = true,
            Modifier::Cmd => self.cmd = true,
        }
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Ctrl => self.ctrl,
            Modifier::Shift => self.shift,
            Modifier::Alt => self.alt,
            Modifier::Cmd => self.cmd,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.shift && !self.alt && !self.cmd
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Все модификаторы `self` входят в `other`
    pub fn is_subset_of(&self, other: &Modifiers) -> bool {
        self.iter().all(|m| other.contains(m))
    }

    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.into_iter().filter(move |m| self.contains(*m))
    }

    pub fn to_vec(&self) -> SmallVec<[&'static str; 4]> {
        self.iter().map(Modifier::token).collect()
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Сырое событие клавиатуры в том виде, в каком его отдаёт страница
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawKeyEvent {
    pub key: String,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub shift_key: bool,
    #[serde(default)]
    pub alt_key: bool,
    #[serde(default)]
    pub meta_key: bool,
}

impl RawKeyEvent {
    #[cfg(test)]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl_key: false,
            shift_key: false,
            alt_key: false,
            meta_key: false,
        }
    }

    /// Выставить флаги модификаторов, как их сообщает браузер
    #[cfg(test)]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.ctrl_key = modifiers.ctrl;
        self.shift_key = modifiers.shift;
        self.alt_key = modifiers.alt;
        self.meta_key = modifiers.cmd;
        self
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl_key,
            shift: self.shift_key,
            alt: self.alt_key,
            cmd: self.meta_key,
        }
    }

    /// Канонический токен клавиши: имя модификатора или `key` в нижнем регистре
    pub fn token(&self) -> String {
        match Modifier::from_dom_key(&self.key) {
            Some(modifier) => modifier.token().to_string(),
            None => self.key.to_lowercase(),
        }
    }

    /// Сама нажатая клавиша является модификатором
    pub fn modifier_key(&self) -> Option<Modifier> {
        Modifier::from_dom_key(&self.key)
    }
}

impl fmt::Display for RawKeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.token(), self.modifiers())
    }
}
