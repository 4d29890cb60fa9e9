//! UI module for nonoto
//!
//! Built with iced. All state changes go through `NonotoApp::update`; the
//! per-category logic lives in `handlers`.

pub mod app;
pub mod handlers;
pub mod message;

pub use app::NonotoApp;
