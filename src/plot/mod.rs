//! Chart rendering.

pub mod chart;
pub mod font;

pub use chart::*;
pub use font::{ensure_font, font_available};
