use crate::error::Result;
use crate::events::{BackgroundRequest, ContentMessage, PageEvent, TabId};
use crate::services::navigator::TabNavigator;
use crate::services::resolver::{build_search_url, DefinitionResolver};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::debug_if_enabled;

/// Запрос вкладки к фоновой части
pub type BackgroundEnvelope = (TabId, BackgroundRequest);

/// Фоновая часть: навигация и поиск определений для всех вкладок
pub struct Backend {
    resolver: Arc<DefinitionResolver>,
    navigator: Arc<dyn TabNavigator>,
    // Канал каждой вкладки: по нему ответ попадает в движок, отправивший запрос
    tabs: DashMap<TabId, mpsc::UnboundedSender<PageEvent>>,
}

impl Backend {
    pub fn new(resolver: Arc<DefinitionResolver>, navigator: Arc<dyn TabNavigator>) -> Self {
        info!("Инициализация Backend");
        Self {
            resolver,
            navigator,
            tabs: DashMap::new(),
        }
    }

    pub fn register_tab(&self, tab: TabId, sender: mpsc::UnboundedSender<PageEvent>) {
        debug_if_enabled!("Регистрация вкладки {}", tab);
        self.tabs.insert(tab, sender);
    }

    pub fn unregister_tab(&self, tab: TabId) {
        if self.tabs.remove(&tab).is_some() {
            debug_if_enabled!("Вкладка {} закрыта", tab);
        }
    }

    pub async fn run(
        self: Arc<Self>,
        mut requests: mpsc::UnboundedReceiver<BackgroundEnvelope>,
    ) -> Result<()> {
        info!("Backend запущен");

        while let Some((tab, request)) = requests.recv().await {
            Arc::clone(&self).handle_request(tab, request).await;
        }

        info!("Канал запросов закрыт, Backend завершает работу");
        Ok(())
    }

    pub async fn handle_request(self: Arc<Self>, tab: TabId, request: BackgroundRequest) {
        debug_if_enabled!("Запрос от {}: {}", tab, request);

        match request {
            BackgroundRequest::Search {
                text,
                search_engine,
                open_in_new_tab,
            } => {
                if let Err(e) = self.handle_search(&text, &search_engine, open_in_new_tab).await {
                    error!("Не удалось выполнить поиск: {}", e);
                }
            }
            BackgroundRequest::GetDefinition { text, source } => {
                // Запрос к сети не блокирует обработку следующих сообщений
                tokio::spawn(async move {
                    self.handle_definition(tab, &text, &source).await;
                });
            }
        }
    }

    async fn handle_search(&self, text: &str, engine: &str, open_in_new_tab: bool) -> Result<()> {
        let query = text.trim();
        if query.is_empty() {
            return Ok(());
        }

        let url = build_search_url(engine, query);
        if open_in_new_tab {
            self.navigator.open_in_background_tab(&url).await
        } else {
            self.navigator.update_active_tab(&url).await
        }
    }

    async fn handle_definition(&self, tab: TabId, text: &str, source: &str) {
        let data = self.resolver.resolve(text, source).await;
        let message = PageEvent::Message(ContentMessage::ShowDefinition { data });

        let Some(sender) = self.tabs.get(&tab).map(|entry| entry.value().clone()) else {
            warn!("Вкладка {} уже закрыта, определение отброшено", tab);
            return;
        };

        if sender.send(message).is_err() {
            warn!("Движок вкладки {} остановлен, определение отброшено", tab);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DefinitionResult;
    use crate::services::navigator::{InMemoryTabs, TabRecord};
    use crate::services::resolver::testing::{MockFetcher, MockResponse};

    fn backend(fetcher: MockFetcher) -> (Arc<Backend>, Arc<InMemoryTabs>) {
        let tabs = Arc::new(InMemoryTabs::new());
        let resolver = Arc::new(DefinitionResolver::new(Arc::new(fetcher)));
        (Arc::new(Backend::new(resolver, tabs.clone())), tabs)
    }

    #[tokio::test]
    async fn test_search_opens_background_tab() {
        let (backend, tabs) = backend(MockFetcher::new());

        backend
            .clone()
            .handle_request(
                TabId(1),
                BackgroundRequest::Search {
                    text: " hello world ".to_string(),
                    search_engine: "bing".to_string(),
                    open_in_new_tab: true,
                },
            )
            .await;

        assert_eq!(
            tabs.tabs()[1],
            TabRecord {
                url: "https://www.bing.com/search?q=hello%20world".to_string(),
                active: false
            }
        );
    }

    #[tokio::test]
    async fn test_search_in_active_tab_and_blank_ignored() {
        let (backend, tabs) = backend(MockFetcher::new());

        for text in ["   ", "rust"] {
            backend
                .clone()
                .handle_request(
                    TabId(1),
                    BackgroundRequest::Search {
                        text: text.to_string(),
                        search_engine: "unknown".to_string(),
                        open_in_new_tab: false,
                    },
                )
                .await;
        }

        assert_eq!(
            tabs.tabs(),
            vec![TabRecord {
                url: "https://www.google.com/search?q=rust".to_string(),
                active: true
            }]
        );
    }

    #[tokio::test]
    async fn test_definition_routed_to_requesting_tab() {
        let (backend, _) = backend(MockFetcher::new().respond(
            "https://api.dictionaryapi.dev/",
            MockResponse::Status(404),
        ));
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        backend.register_tab(TabId(1), tx1);
        backend.register_tab(TabId(2), tx2);

        backend
            .clone()
            .handle_request(
                TabId(2),
                BackgroundRequest::GetDefinition {
                    text: "foo".to_string(),
                    source: "dictionary".to_string(),
                },
            )
            .await;

        let message = rx2.recv().await.expect("definition message");
        assert_eq!(
            message,
            PageEvent::Message(ContentMessage::ShowDefinition {
                data: DefinitionResult::not_found("foo")
            })
        );
        assert!(rx1.try_recv().is_err());
    }
}
