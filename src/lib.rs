pub mod app;
pub mod book;
pub mod cli;
pub mod client;
pub mod events;
pub mod narration;
pub mod settings;
pub mod story;
pub mod ui;

pub use app::App;
