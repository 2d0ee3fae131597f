use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;

pub const DEFAULT_SEARCH_ENGINE: &str = "google";
pub const DEFAULT_DEFINITION_SOURCE: &str = "dictionary";

static SEARCH_ENGINES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("google", "https://www.google.com/search?q={query}"),
        ("duckduckgo", "https://duckduckgo.com/?q={query}"),
        ("bing", "https://www.bing.com/search?q={query}"),
    ])
});

static DEFINITION_ENDPOINTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("dictionary", "https://api.dictionaryapi.dev/api/v2/entries/en/{word}"),
        ("wiktionary", "https://en.wiktionary.org/api/rest_v1/page/definition/{word}"),
        ("urban", "https://api.urbandictionary.com/v0/define?term={word}"),
    ])
});

// Те же правила, что у encodeURIComponent: без кодирования остаются A-Z a-z 0-9 - _ . ! ~ * ' ( )
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// URL поиска; неизвестная поисковая система заменяется на google
pub fn build_search_url(engine: &str, query: &str) -> String {
    let template = SEARCH_ENGINES
        .get(engine)
        .or_else(|| SEARCH_ENGINES.get(DEFAULT_SEARCH_ENGINE))
        .copied()
        .unwrap_or_default();
    template.replace("{query}", &encode_component(query))
}

/// URL источника определений; слово приводится к нижнему регистру
pub fn build_definition_url(source: &str, word: &str) -> String {
    let template = DEFINITION_ENDPOINTS
        .get(source)
        .or_else(|| DEFINITION_ENDPOINTS.get(DEFAULT_DEFINITION_SOURCE))
        .copied()
        .unwrap_or_default();
    template.replace("{word}", &encode_component(&word.to_lowercase()))
}
