pub mod app;
pub mod components;
pub mod state;

pub use app::MessengerApp;
pub use state::{AppState, PanelMode, SendPhase};
