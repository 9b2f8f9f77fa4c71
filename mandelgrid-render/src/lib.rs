pub mod buffer;
pub mod colorize;
pub mod error;
pub mod grid;
pub mod palette;
pub mod renderer;
pub mod session;

pub use buffer::RenderBuffer;
pub use colorize::{color_pixel, colorize};
pub use error::RenderError;
pub use grid::SampleGrid;
pub use palette::{Palette, PaletteSettings, PaletteVariant};
pub use renderer::{build_grid, RenderCancel, RenderResult};
pub use session::{BusyGuard, RenderedView, Session};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
