pub mod keyboard;
pub mod messages;
pub mod page;

pub use keyboard::{Modifier, Modifiers, RawKeyEvent};
pub use messages::{BackgroundRequest, ContentMessage, DefinitionResult, Meaning, TabId};
pub use page::{InputLine, PageEvent};
