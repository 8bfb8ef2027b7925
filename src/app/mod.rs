//! Application controller: state, background work and key handling

pub mod background;
pub mod input;
pub mod messages;
pub mod state;

pub use background::RuntimeContext;
pub use state::{App, Effect, InputMode, RecommendationState, Tab, Toast, ViewState};
