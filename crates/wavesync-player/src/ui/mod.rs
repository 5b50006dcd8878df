//! UI module for wavesync-player
//!
//! Built with iced. Input becomes [`Message`]s, which the app forwards to the
//! domain session; background work comes back as messages too.

pub mod app;
pub mod message;

pub use app::WavesyncApp;
pub use message::Message;
