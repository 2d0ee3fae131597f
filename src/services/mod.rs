pub mod backend;
pub mod dispatcher;
pub mod engine;
pub mod keyboard;
pub mod navigator;
pub mod popup;
pub mod resolver;
pub mod selection;
pub mod timers;

pub use backend::Backend;
pub use engine::{ContentEngine, EngineHandle};
pub use navigator::{CommandNavigator, InMemoryTabs, TabNavigator};
pub use popup::TerminalRenderer;
pub use resolver::{DefinitionFetcher, DefinitionResolver, DryRunFetcher, HttpFetcher};
