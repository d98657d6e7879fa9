pub mod braille;
pub mod canvas;
pub mod compose;
pub mod halfblock;
pub mod text;

pub use canvas::{Canvas, ColorMode, RenderMode};
pub use text::{Style, TextLayer};
