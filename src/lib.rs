pub mod args;
pub mod backend;
pub mod commands;
pub mod config;
pub mod console;
pub mod credentials;
pub mod providers;
pub mod session;
pub mod theme;
pub mod transcript;

// Re-export the session types at crate root for convenience
pub use session::{ChatSession, RenderState, SessionError, SessionPhase};
