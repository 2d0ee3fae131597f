use crate::error::{AtsError, Result};
use parking_lot::RwLock;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

/// Граница навигации по вкладкам
#[async_trait::async_trait]
pub trait TabNavigator: Send + Sync {
    /// Открыть URL в новой фоновой вкладке
    async fn open_in_background_tab(&self, url: &str) -> Result<()>;

    /// Перейти по URL в активной вкладке
    async fn update_active_tab(&self, url: &str) -> Result<()>;
}

/// Открывает URL внешней командой (xdg-open, open, ...)
pub struct CommandNavigator {
    program: String,
}

impl CommandNavigator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn launch(&self, url: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AtsError::ServiceUnavailable(format!("{} не запускается: {}", self.program, e)))?;

        // Дочерний процесс дожидается отдельная задача, чтобы он не оставался зомби
        let program = self.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    warn!("{} завершился с кодом {}", program, status);
                }
                Ok(_) => {}
                Err(e) => warn!("Не удалось дождаться {}: {}", program, e),
            }
        });

        Ok(())
    }
}

#[async_trait::async_trait]
impl TabNavigator for CommandNavigator {
    async fn open_in_background_tab(&self, url: &str) -> Result<()> {
        info!("Открытие в новой вкладке: {}", url);
        self.launch(url)
    }

    async fn update_active_tab(&self, url: &str) -> Result<()> {
        // У внешней команды нет понятия активной вкладки - открываем так же
        info!("Переход в активной вкладке: {}", url);
        self.launch(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabRecord {
    pub url: String,
    pub active: bool,
}

/// Вкладки в памяти для режима сухого запуска и тестов
#[derive(Debug)]
pub struct InMemoryTabs {
    tabs: RwLock<Vec<TabRecord>>,
}

impl Default for InMemoryTabs {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTabs {
    pub fn new() -> Self {
        Self {
            tabs: RwLock::new(vec![TabRecord {
                url: "about:blank".to_string(),
                active: true,
            }]),
        }
    }

    #[cfg(test)]
    pub fn tabs(&self) -> Vec<TabRecord> {
        self.tabs.read().clone()
    }
}

#[async_trait::async_trait]
impl TabNavigator for InMemoryTabs {
    async fn open_in_background_tab(&self, url: &str) -> Result<()> {
        info!("[DRY RUN] Новая фоновая вкладка: {}", url);
        self.tabs.write().push(TabRecord {
            url: url.to_string(),
            active: false,
        });
        Ok(())
    }

    async fn update_active_tab(&self, url: &str) -> Result<()> {
        info!("[DRY RUN] Переход в активной вкладке: {}", url);
        let mut tabs = self.tabs.write();
        match tabs.iter_mut().find(|tab| tab.active) {
            Some(tab) => tab.url = url.to_string(),
            None => {
                return Err(AtsError::ServiceUnavailable(
                    "нет активной вкладки".to_string(),
                ))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_tabs() {
        let tabs = InMemoryTabs::new();

        tabs.open_in_background_tab("https://a.example").await.unwrap();
        tabs.update_active_tab("https://b.example").await.unwrap();

        assert_eq!(
            tabs.tabs(),
            vec![
                TabRecord {
                    url: "https://b.example".to_string(),
                    active: true
                },
                TabRecord {
                    url: "https://a.example".to_string(),
                    active: false
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_command_navigator_fails_for_missing_program() {
        let navigator = CommandNavigator::new("/nonexistent/ats-open");

        let err = navigator
            .open_in_background_tab("https://a.example")
            .await
            .unwrap_err();
        assert!(matches!(err, AtsError::ServiceUnavailable(_)));
    }

    #[cfg(target_os = "linux")]
    fn zombie_children() -> usize {
        let Ok(tasks) = std::fs::read_dir("/proc/self/task") else {
            return 0;
        };

        tasks
            .flatten()
            .filter_map(|task| std::fs::read_to_string(task.path().join("children")).ok())
            .flat_map(|pids| {
                pids.split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|pid| {
                std::fs::read_to_string(format!("/proc/{pid}/stat"))
                    .map(|stat| {
                        stat.rsplit(')')
                            .next()
                            .unwrap_or_default()
                            .trim_start()
                            .starts_with('Z')
                    })
                    .unwrap_or(false)
            })
            .count()
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_command_navigator_reaps_children() {
        let navigator = CommandNavigator::new("true");

        for _ in 0..3 {
            navigator
                .open_in_background_tab("https://a.example")
                .await
                .unwrap();
        }
        navigator.update_active_tab("https://b.example").await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        assert_eq!(zombie_children(), 0);
    }
}
