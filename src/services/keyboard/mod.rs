mod combo;
mod debounce;
mod key_state;

pub use self::combo::{has_conflict, KeyCombo, TriggerConfig};
pub use self::debounce::{DebounceGate, GateDecision};
pub use self::key_state::KeyStateTracker;
