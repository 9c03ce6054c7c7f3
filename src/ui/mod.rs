//! Ratatui front-end: one screen with the location banner, the item list, and
//! the add/delete popups.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
