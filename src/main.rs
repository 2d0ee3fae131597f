use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use events::{InputLine, TabId};
use services::{
    Backend, CommandNavigator, ContentEngine, DefinitionFetcher, DefinitionResolver,
    DryRunFetcher, EngineHandle, HttpFetcher, InMemoryTabs, TabNavigator, TerminalRenderer,
};

#[derive(Parser, Debug)]
#[command(name = "auto-text-search")]
#[command(about = "Поиск и определение выделенного текста по настраиваемой комбинации клавиш")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "ats.toml")]
    config: String,

    /// Режим сухого запуска (без сети и без открытия вкладок)
    #[arg(long)]
    dry_run: bool,

    /// Фильтр логирования (перекрывает logging.filter из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    /// Файл с событиями страницы в формате JSON lines (по умолчанию stdin)
    #[arg(short, long)]
    events: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Config::load(&args.config)?;

    // Инициализация системы логирования
    let filter = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.filter.clone());
    init_tracing(&filter, &config.logging.format)?;

    info!("Запуск auto-text-search v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - сеть и открытие вкладок отключены");
    }

    // Фоновая часть
    let fetcher: Arc<dyn DefinitionFetcher> = if args.dry_run {
        Arc::new(DryRunFetcher)
    } else {
        Arc::new(HttpFetcher::new(&config.http)?)
    };
    let navigator: Arc<dyn TabNavigator> = if args.dry_run {
        Arc::new(InMemoryTabs::new())
    } else {
        Arc::new(CommandNavigator::new(config.navigation.open_command.clone()))
    };
    let backend = Arc::new(Backend::new(
        Arc::new(DefinitionResolver::new(fetcher)),
        navigator,
    ));

    // Движок единственной страницы
    let tab = TabId(1);
    let (backend_tx, backend_rx) = mpsc::unbounded_channel();
    let engine = ContentEngine::new(config.settings.clone(), &config.timing)?;
    let handle = EngineHandle::spawn(
        tab,
        engine,
        backend_tx,
        Box::new(TerminalRenderer::new(std::io::stdout())),
    );
    backend.register_tab(tab, handle.sender());

    info!("Все компоненты инициализированы");

    let backend_handle = tokio::spawn({
        let backend = backend.clone();
        async move {
            if let Err(e) = backend.run(backend_rx).await {
                error!("Ошибка в Backend: {}", e);
            }
        }
    });

    // Подача событий до конца ввода или сигнала завершения
    tokio::select! {
        result = feed_input(args.events.as_deref(), &handle) => match result {
            Ok(count) => info!("Ввод закончился, обработано событий: {}", count),
            Err(e) => error!("Ошибка чтения событий: {}", e),
        },
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
            Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
        },
    }

    info!("Завершение работы...");
    backend.unregister_tab(tab);

    // Движок владеет каналом запросов: после его остановки Backend завершится сам
    let shutdown_timeout = Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        handle.dispose().await;
        let _ = backend_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("auto-text-search завершил работу");
    Ok(())
}

async fn feed_input(path: Option<&std::path::Path>, handle: &EngineHandle) -> Result<usize> {
    match path {
        Some(path) => {
            info!("Воспроизведение событий из {:?}", path);
            let file = tokio::fs::File::open(path).await?;
            feed_events(BufReader::new(file), handle).await
        }
        None => feed_events(BufReader::new(tokio::io::stdin()), handle).await,
    }
}

async fn feed_events<R: AsyncBufRead + Unpin>(reader: R, handle: &EngineHandle) -> Result<usize> {
    let mut lines = reader.lines();
    let mut count = 0;
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match InputLine::parse(&line) {
            None => {}
            Some(Ok(InputLine::Wait { ms, .. })) => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            Some(Ok(InputLine::Event(event))) => {
                handle.send(event)?;
                count += 1;
            }
            Some(Err(e)) => warn!("Строка {} пропущена: {}", line_no, e),
        }
    }

    Ok(count)
}

fn init_tracing(filter: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(filter))?;

    // Логи идут в stderr, stdout занят всплывающим окном
    let registry = tracing_subscriber::registry().with(filter);
    if format == "pretty" {
        registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
