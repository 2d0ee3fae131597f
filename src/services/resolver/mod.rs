//! DefinitionResolver: поиск определения с откатом на каноничный источник.
//!
//! Откат ограничен одной попыткой: если предпочтительный источник не дал
//! определений, запрос повторяется против `dictionary`, после чего вызывающей
//! стороне возвращается ошибка в виде `DefinitionResult`.

mod fetcher;
mod sources;
mod urls;

pub use self::fetcher::{DefinitionFetcher, DryRunFetcher, HttpFetcher};
pub use self::sources::DefinitionSource;
pub use self::urls::{build_definition_url, build_search_url};

use crate::error::Result;
use crate::events::DefinitionResult;
use std::sync::Arc;
use tracing::{info, warn};

pub struct DefinitionResolver {
    fetcher: Arc<dyn DefinitionFetcher>,
}

impl DefinitionResolver {
    pub fn new(fetcher: Arc<dyn DefinitionFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn resolve(&self, word: &str, preferred_source: &str) -> DefinitionResult {
        let word = word.trim();
        let source = DefinitionSource::from_key(preferred_source);

        let error = match self.lookup(word, source).await {
            Ok(result) => return result,
            Err(e) => e,
        };
        warn!("Источник {} не дал определения для {:?}: {}", source, word, error);

        if source == DefinitionSource::CANONICAL {
            return DefinitionResult::not_found(word);
        }

        info!("Откат на источник {} для {:?}", DefinitionSource::CANONICAL, word);
        match self.lookup(word, DefinitionSource::CANONICAL).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "Каноничный источник тоже не дал определения для {:?}: {}",
                    word, e
                );
                DefinitionResult::not_found(word)
            }
        }
    }

    async fn lookup(&self, word: &str, source: DefinitionSource) -> Result<DefinitionResult> {
        let url = build_definition_url(source.key(), word);
        let body = self.fetcher.fetch_json(&url).await?;
        source.parse(&body, word)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::error::AtsError;
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::collections::HashMap;

    pub enum MockResponse {
        Status(u16),
        Json(Value),
    }

    /// Отвечает по префиксу URL и запоминает все запросы
    #[derive(Default)]
    pub struct MockFetcher {
        responses: Vec<(String, MockResponse)>,
        calls: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, url_prefix: &str, response: MockResponse) -> Self {
            self.responses.push((url_prefix.to_string(), response));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        pub fn calls_by_host(&self) -> HashMap<String, usize> {
            let mut counts = HashMap::new();
            for url in self.calls() {
                let host = url.split('/').nth(2).unwrap_or_default().to_string();
                *counts.entry(host).or_insert(0) += 1;
            }
            counts
        }
    }

    #[async_trait::async_trait]
    impl DefinitionFetcher for MockFetcher {
        async fn fetch_json(&self, url: &str) -> Result<Value> {
            self.calls.lock().push(url.to_string());
            match self.responses.iter().find(|(prefix, _)| url.starts_with(prefix)) {
                Some((_, MockResponse::Json(body))) => Ok(body.clone()),
                Some((_, MockResponse::Status(status))) => Err(AtsError::HttpStatus {
                    status: *status,
                    url: url.to_string(),
                }),
                None => Err(AtsError::ServiceUnavailable(format!("нет ответа для {url}"))),
            }
        }
    }
}
