//! Map rendering for reservoir flood results.
//!
//! A frame is composed bottom-up:
//! - Background strategy (plain, hillshade or imagery)
//! - Flood depth overlay through a blue colormap at partial opacity
//! - Vector layers (rivers, dams) in their own styles
//! - Colorbar, and optionally title and legend text when a font is set
//!
//! Static maps are written as PNG, animations as looping GIF.

pub mod animation;
pub mod background;
pub mod colormap;
pub mod error;
pub mod hillshade;
pub mod legend;
pub mod map;
pub mod overlay;
pub mod png;
pub mod style;
pub mod text;
pub mod viewport;

pub use background::{background_for, BackgroundStrategy, HillshadeBackground, ImageryBackground, PlainBackground};
pub use colormap::{Color, Colormap};
pub use error::{RenderError, RenderResult};
pub use map::{frame_title, MapRenderer};
pub use style::{BackgroundKind, FigureRect, HillshadeParams, RenderConfig};
pub use viewport::Viewport;
