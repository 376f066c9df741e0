pub mod canvas;
pub mod overlay;
pub mod skeleton;
#[cfg(feature = "desktop")]
pub mod window;

pub use canvas::{Canvas, DisplaySurface, FrameBuffer};
pub use overlay::{OverlayRenderer, OverlayStyle};
pub use skeleton::{edges, SkeletonEdge, SKELETON_EDGES};
#[cfg(feature = "desktop")]
pub use window::OverlayWindow;
