mod overlay;
mod raster;
mod renderer;

pub(crate) use overlay::OverlayData;
pub use raster::{faded, Canvas};
pub use renderer::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}
