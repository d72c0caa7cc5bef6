pub mod app;
pub mod keymap;
pub mod render;
pub mod theme;

pub use app::run;
