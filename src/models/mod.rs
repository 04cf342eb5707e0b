pub mod app_state;
pub mod game_session;
pub mod messages;

// Re-export important types
pub use app_state::*;
pub use game_session::*;
pub use messages::*;
