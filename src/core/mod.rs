pub mod constants;
pub mod engine;
pub mod events;
pub mod pacing;
pub mod settings;
pub mod state;
