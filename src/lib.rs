//! Pollframe
//!
//! Renders poll and election state as images for social "frame" cards.
//! A validated [`Payload`] is composed into a [`Scene`](rendering::Scene)
//! (fitted titles, lettered choices, percentage bars), and a
//! [`Renderer`](rendering::Renderer) turns the scene into image bytes while
//! pulling fallback fonts and emoji icons from an [`AssetResolver`].
//!
//! # Example
//!
//! ```no_run
//! use pollframe::{FramePipeline, Payload, RenderConfig};
//! use pollframe::rendering::TextRenderer;
//!
//! # async fn run() -> pollframe::Result<()> {
//! let pipeline = FramePipeline::new(RenderConfig::default(), TextRenderer::new())?;
//! let payload = Payload::from_json(
//!     r#"{"type":"results","question":"Pizza?","choices":["Yes","No"],"results":[3,1]}"#,
//! )?;
//! let image = pipeline.render(&payload).await?;
//! println!("{} bytes", image.data.len());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use serde::Deserialize;

pub mod assets;
pub mod error;
pub mod payload;
pub mod rendering;

pub use assets::{AssetCache, AssetLoader, AssetResolver, ResolvedAsset};
pub use error::{Error, Result};
pub use payload::{Payload, PayloadKind, RawPayload, ResultsPayload};

use rendering::{EnvelopeTable, FrameImage, Renderer, Scene, SceneBuilder};

/// Configuration for scene building and asset lookup
///
/// Defaults target a 1.91:1 frame card with assets served from `public/`:
/// - fonts are read from `public/fonts/{id}.ttf`
/// - emoji icons are read from `public/emojis/{codepoints}.svg`
/// - progress bars have 20 cells
///
/// # Examples
///
/// ```
/// let cfg = pollframe::RenderConfig::default();
/// assert_eq!(cfg.bar_steps, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Directory holding fallback font files
    pub font_dir: PathBuf,
    /// Extension of the font files, without the dot
    pub font_extension: String,
    /// Directory holding emoji SVG icons
    pub emoji_dir: PathBuf,
    /// Number of cells in a result progress bar
    pub bar_steps: u32,
    /// Text fitting presets
    pub envelopes: EnvelopeTable,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 630,
            font_dir: PathBuf::from("public/fonts"),
            font_extension: "ttf".to_string(),
            emoji_dir: PathBuf::from("public/emojis"),
            bar_steps: 20,
            envelopes: EnvelopeTable::default(),
        }
    }
}

impl RenderConfig {
    /// Load a JSON config file; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: RenderConfig = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bar_steps == 0 {
            return Err(Error::ConfigError("bar_steps must be > 0".into()));
        }
        if self.font_extension.is_empty() {
            return Err(Error::ConfigError("font_extension must not be empty".into()));
        }
        self.envelopes.validate()
    }
}

/// Payload in, image out: a scene builder, an asset resolver and a renderer.
pub struct FramePipeline<R: Renderer> {
    builder: SceneBuilder,
    resolver: AssetResolver,
    renderer: R,
}

impl<R: Renderer> FramePipeline<R> {
    /// Build a pipeline with a fresh asset cache.
    pub fn new(config: RenderConfig, renderer: R) -> Result<Self> {
        Self::with_cache(config, renderer, Arc::new(AssetCache::new()))
    }

    /// Build a pipeline sharing an existing asset cache.
    pub fn with_cache(
        config: RenderConfig,
        renderer: R,
        cache: assets::SharedAssetCache,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            builder: SceneBuilder::new(&config),
            resolver: AssetResolver::new(&config, cache),
            renderer,
        })
    }

    /// Replace the scene builder (e.g. one with a pinned clock).
    pub fn with_builder(mut self, builder: SceneBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn resolver(&self) -> &AssetResolver {
        &self.resolver
    }

    pub fn scene(&self, payload: &Payload) -> Scene {
        debug!("Building {:?} scene", payload.kind());
        self.builder.build(payload)
    }

    /// Render a payload. Renderer failures are returned unchanged.
    pub async fn render(&self, payload: &Payload) -> Result<FrameImage> {
        let scene = self.scene(payload);
        self.renderer.render(&scene, &self.resolver).await
    }
}
