use crate::error::{AtsError, Result};
use crate::events::{DefinitionResult, Meaning};
use serde_json::Value;
use std::fmt;

const MAX_MEANINGS: usize = 3;
const MAX_DEFINITIONS_PER_MEANING: usize = 2;
const WIKTIONARY_ENTRIES: usize = 3;
const URBAN_ENTRIES: usize = 2;

/// Источник определений
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionSource {
    Dictionary,
    Wiktionary,
    Urban,
}

impl DefinitionSource {
    /// Каноничный источник, на который выполняется откат
    pub const CANONICAL: DefinitionSource = DefinitionSource::Dictionary;

    /// Неизвестный ключ трактуется как каноничный источник
    pub fn from_key(key: &str) -> Self {
        match key {
            "wiktionary" => DefinitionSource::Wiktionary,
            "urban" => DefinitionSource::Urban,
            _ => DefinitionSource::Dictionary,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            DefinitionSource::Dictionary => "dictionary",
            DefinitionSource::Wiktionary => "wiktionary",
            DefinitionSource::Urban => "urban",
        }
    }

    /// Нормализовать ответ источника. Ответ без пригодных определений - ошибка.
    pub fn parse(self, body: &Value, word: &str) -> Result<DefinitionResult> {
        let result = match self {
            DefinitionSource::Dictionary => parse_dictionary(body, word),
            DefinitionSource::Wiktionary => parse_wiktionary(body, word),
            DefinitionSource::Urban => parse_urban(body, word),
        };

        match result {
            Some(mut result) if !result.meanings.is_empty() => {
                result.meanings.truncate(MAX_MEANINGS);
                Ok(result)
            }
            _ => Err(AtsError::NoDefinitions(self.key().to_string())),
        }
    }
}

impl fmt::Display for DefinitionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// api.dictionaryapi.dev: [{ word, phonetic, meanings: [{ partOfSpeech, definitions: [{ definition, example }] }] }]
fn parse_dictionary(body: &Value, word: &str) -> Option<DefinitionResult> {
    let entry = body.as_array()?.first()?;

    let meanings = entry
        .get("meanings")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .flat_map(|meaning| {
            let part_of_speech = non_empty_str(meaning.get("partOfSpeech"))
                .unwrap_or("unknown")
                .to_string();
            meaning
                .get("definitions")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(move |definition| {
                    let text = non_empty_str(definition.get("definition"))?;
                    Some(Meaning {
                        part_of_speech: part_of_speech.clone(),
                        definition: text.to_string(),
                        example: non_empty_str(definition.get("example")).map(str::to_string),
                    })
                })
                .take(MAX_DEFINITIONS_PER_MEANING)
        })
        .take(MAX_MEANINGS)
        .collect();

    Some(DefinitionResult::found(
        non_empty_str(entry.get("word")).unwrap_or(word),
        non_empty_str(entry.get("phonetic")).map(str::to_string),
        meanings,
    ))
}

// en.wiktionary.org REST: { en: [{ partOfSpeech, definitions: [{ definition: "<html>" }] }] }
fn parse_wiktionary(body: &Value, word: &str) -> Option<DefinitionResult> {
    let entries = body.get("en")?.as_array()?;

    let meanings = entries
        .iter()
        .take(WIKTIONARY_ENTRIES)
        .filter_map(|entry| {
            let definition = entry
                .get("definitions")
                .and_then(Value::as_array)?
                .iter()
                .filter_map(|d| d.get("definition").and_then(Value::as_str))
                .map(strip_html)
                .find(|d| !d.is_empty())?;
            Some(Meaning {
                part_of_speech: non_empty_str(entry.get("partOfSpeech"))
                    .unwrap_or("unknown")
                    .to_string(),
                definition,
                example: None,
            })
        })
        .collect();

    Some(DefinitionResult::found(word, None, meanings))
}

// api.urbandictionary.com: { list: [{ definition, example }] } со ссылками в [квадратных скобках]
fn parse_urban(body: &Value, word: &str) -> Option<DefinitionResult> {
    let list = body.get("list")?.as_array()?;

    let meanings = list
        .iter()
        .take(URBAN_ENTRIES)
        .filter_map(|entry| {
            let definition = strip_brackets(non_empty_str(entry.get("definition"))?);
            if definition.is_empty() {
                return None;
            }
            Some(Meaning {
                part_of_speech: "slang".to_string(),
                definition,
                example: non_empty_str(entry.get("example"))
                    .map(strip_brackets)
                    .filter(|e| !e.is_empty()),
            })
        })
        .collect();

    Some(DefinitionResult::found(word, None, meanings))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn strip_brackets(text: &str) -> String {
    text.chars().filter(|c| *c != '[' && *c != ']').collect::<String>().trim().to_string()
}

fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dictionary_truncates() {
        let body = json!([{
            "word": "run",
            "phonetic": "/rʌn/",
            "meanings": [
                {"partOfSpeech": "verb", "definitions": [
                    {"definition": "move fast", "example": "run home"},
                    {"definition": "manage"},
                    {"definition": "flow"}
                ]},
                {"partOfSpeech": "noun", "definitions": [
                    {"definition": "an act of running"},
                    {"definition": "a series"}
                ]}
            ]
        }]);

        let result = DefinitionSource::Dictionary.parse(&body, "Run").unwrap();
        assert_eq!(result.word, "run");
        assert_eq!(result.phonetic.as_deref(), Some("/rʌn/"));
        let definitions: Vec<_> = result.meanings.iter().map(|m| m.definition.as_str()).collect();
        assert_eq!(definitions, vec!["move fast", "manage", "an act of running"]);
        assert_eq!(result.meanings[0].example.as_deref(), Some("run home"));
        assert_eq!(result.meanings[2].part_of_speech, "noun");
    }

    #[test]
    fn test_parse_dictionary_empty_is_error() {
        assert!(DefinitionSource::Dictionary.parse(&json!([]), "x").is_err());
        assert!(DefinitionSource::Dictionary
            .parse(&json!({"title": "No Definitions Found"}), "x")
            .is_err());
        assert!(DefinitionSource::Dictionary
            .parse(&json!([{"word": "x", "meanings": []}]), "x")
            .is_err());
    }

    #[test]
    fn test_parse_wiktionary_strips_html() {
        let body = json!({
            "en": [
                {"partOfSpeech": "Verb", "definitions": [
                    {"definition": "To <a href=\"/wiki/move\">move</a> swiftly."},
                    {"definition": "ignored"}
                ]},
                {"partOfSpeech": "Noun", "definitions": []},
                {"partOfSpeech": "Noun", "definitions": [{"definition": "<b>A</b> run."}]},
                {"partOfSpeech": "Adjective", "definitions": [{"definition": "beyond limit"}]}
            ]
        });

        let result = DefinitionSource::Wiktionary.parse(&body, "run").unwrap();
        assert_eq!(result.meanings.len(), 2);
        assert_eq!(result.meanings[0].definition, "To move swiftly.");
        assert_eq!(result.meanings[1].definition, "A run.");
        assert!(result.phonetic.is_none());
    }

    #[test]
    fn test_parse_urban_removes_brackets() {
        let body = json!({"list": [
            {"definition": "[cool] thing", "example": "that is [yeet]"},
            {"definition": "second", "example": ""},
            {"definition": "third"}
        ]});

        let result = DefinitionSource::Urban.parse(&body, "yeet").unwrap();
        assert_eq!(result.meanings.len(), 2);
        assert_eq!(result.meanings[0].definition, "cool thing");
        assert_eq!(result.meanings[0].example.as_deref(), Some("that is yeet"));
        assert_eq!(result.meanings[0].part_of_speech, "slang");
        assert_eq!(result.meanings[1].example, None);

        assert!(DefinitionSource::Urban.parse(&json!({"list": []}), "x").is_err());
    }

    #[test]
    fn test_unknown_source_key() {
        assert_eq!(DefinitionSource::from_key("bogus"), DefinitionSource::Dictionary);
        assert_eq!(DefinitionSource::from_key("urban"), DefinitionSource::Urban);
    }
}
