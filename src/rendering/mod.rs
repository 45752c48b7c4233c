//! Rendering pipeline: text fitting, tally charts, scene building and the
//! renderer boundary.

pub mod fit;
pub mod raster;
pub mod scene;
pub mod tally;

use futures::future::BoxFuture;

use crate::assets::AssetLoader;
use crate::Result;

pub use fit::{fit, SizeEnvelope};
pub use raster::TextRenderer;
pub use scene::{EnvelopeTable, Scene, SceneBuilder, SceneNode};
pub use tally::{render_bar, transform, BarSpec, BarToken, TallySummary};

/// Encoded output of a renderer.
#[derive(Debug, Clone)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl FrameImage {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Turns a scene into image bytes, pulling fonts and icons from `assets`
/// as it lays out text.
pub trait Renderer: Send + Sync {
    fn render<'a>(
        &'a self,
        scene: &'a Scene,
        assets: &'a dyn AssetLoader,
    ) -> BoxFuture<'a, Result<FrameImage>>;
}
