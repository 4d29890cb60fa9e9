//! Message handlers for NonotoApp
//!
//! Each handler module is responsible for a specific category of messages.
//! Handlers receive `&mut NonotoApp` and return `Task<Message>`.

pub mod controls;
pub mod editor;
pub mod generation;
pub mod playback;
pub mod shell;
pub mod tick;
