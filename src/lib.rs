//! chatdesk: sign-in and sign-up screens in front of a chat with a hosted
//! completion model, plus the server that stores registered users.
//!
//! Everything the window does lives here as plain Rust; the GTK front end
//! (feature `gui`) only renders [`session::Session`] and forwards clicks.

pub mod api;
pub mod app;
pub mod error;
pub mod register;
pub mod server;
pub mod session;
pub mod storage;
pub mod typing;

#[cfg(feature = "gui")]
pub mod ui;
#[cfg(feature = "gui")]
pub mod utils;
