//! Theme engine and page rendering.

mod engine;

pub use engine::ThemeEngine;
