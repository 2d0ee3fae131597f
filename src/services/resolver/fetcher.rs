use crate::config::HttpConfig;
use crate::error::{AtsError, Result};
use serde_json::Value;
use std::time::Duration;

use crate::debug_if_enabled;

/// Получение JSON-ответа источника определений
#[async_trait::async_trait]
pub trait DefinitionFetcher: Send + Sync {
    async fn fetch_json(&self, url: &str) -> Result<Value>;
}

/// HTTP-реализация на reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl DefinitionFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value> {
        debug_if_enabled!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AtsError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Заглушка для режима сухого запуска: сеть не используется
pub struct DryRunFetcher;

#[async_trait::async_trait]
impl DefinitionFetcher for DryRunFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value> {
        tracing::info!("[DRY RUN] Запрос определения: {}", url);
        Err(crate::ats_error!(service_unavailable, "сеть отключена в режиме dry-run: {}", url))
    }
}
