//! Glyph fallback fonts and inline emoji icons for the renderer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine as Base64Engine;
use futures::future::{join_all, BoxFuture, FutureExt};
use log::{debug, warn};

use crate::assets::cache::AssetCache;
use crate::assets::catalog::FontCatalog;
use crate::RenderConfig;

/// Discriminator the renderer passes for emoji clusters.
pub const EMOJI_CODE: &str = "emoji";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Font,
    Emoji,
}

/// Cache key of a resolved asset: font file path or emoji icon key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub kind: AssetKind,
    pub code: String,
}

impl AssetKey {
    pub fn font(path: &Path) -> Self {
        Self { kind: AssetKind::Font, code: path.to_string_lossy().into_owned() }
    }

    pub fn emoji(key: &str) -> Self {
        Self { kind: AssetKind::Emoji, code: key.to_string() }
    }
}

/// Raw file contents; `None` when the file could not be read.
pub type AssetBytes = Option<Arc<[u8]>>;

/// The shared store every asset read goes through.
pub type SharedAssetCache = Arc<AssetCache<AssetKey, AssetBytes>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

/// A fallback font handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFace {
    pub name: String,
    pub data: Arc<[u8]>,
    pub weight: u16,
    pub style: FontStyle,
    /// Language tag that selected this font
    pub lang: String,
}

/// Answer to one renderer asset request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAsset {
    /// `data:` URL of an inline icon
    Image(String),
    Fonts(Vec<FontFace>),
    Empty,
}

impl ResolvedAsset {
    pub fn is_empty(&self) -> bool {
        match self {
            ResolvedAsset::Image(url) => url.is_empty(),
            ResolvedAsset::Fonts(fonts) => fonts.is_empty(),
            ResolvedAsset::Empty => true,
        }
    }
}

/// Capability the renderer calls back into while laying out a scene.
///
/// `code` is either [`EMOJI_CODE`] or a `|`-joined list of language tags;
/// `text` is the literal segment that needs the asset. Implementations
/// must not fail: an empty answer means "use the default font" or "omit
/// the glyph".
pub trait AssetLoader: Send + Sync {
    fn resolve<'a>(&'a self, code: &'a str, text: &'a str) -> BoxFuture<'a, ResolvedAsset>;
}

/// Icon file stem for an emoji: its code points as lowercase hex, joined by `_`.
pub fn emoji_key(text: &str) -> String {
    text.chars()
        .map(|c| format!("{:x}", c as u32))
        .collect::<Vec<_>>()
        .join("_")
}

async fn read_asset(kind: &'static str, path: PathBuf) -> AssetBytes {
    debug!("Loading {} asset from {}", kind, path.display());
    match tokio::fs::read(&path).await {
        Ok(data) => Some(Arc::from(data)),
        Err(e) => {
            warn!("Missing {} asset {}: {}", kind, path.display(), e);
            None
        }
    }
}

/// Disk-backed resolver for emoji icons and fallback fonts.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    catalog: FontCatalog,
    font_dir: PathBuf,
    font_extension: String,
    emoji_dir: PathBuf,
    cache: SharedAssetCache,
}

impl AssetResolver {
    pub fn new(config: &RenderConfig, cache: SharedAssetCache) -> Self {
        Self {
            catalog: FontCatalog::new(),
            font_dir: config.font_dir.clone(),
            font_extension: config.font_extension.clone(),
            emoji_dir: config.emoji_dir.clone(),
            cache,
        }
    }

    pub fn cache(&self) -> &SharedAssetCache {
        &self.cache
    }

    /// Resolve one renderer request. Never fails.
    pub async fn resolve(&self, code: &str, text: &str) -> ResolvedAsset {
        if code == EMOJI_CODE {
            match self.emoji(text).await {
                Some(url) => ResolvedAsset::Image(url),
                None => ResolvedAsset::Empty,
            }
        } else {
            ResolvedAsset::Fonts(self.fonts(code).await)
        }
    }

    /// Inline `data:` URL for the icon of `text`, if the store has one.
    pub async fn emoji(&self, text: &str) -> Option<String> {
        let key = emoji_key(text);
        if key.is_empty() {
            return None;
        }
        let path = self.emoji_dir.join(format!("{}.svg", key));
        let svg = self
            .cache
            .memoize(AssetKey::emoji(&key), move || read_asset("emoji", path))
            .await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&svg);
        Some(format!("data:image/svg+xml;base64,{}", encoded))
    }

    /// Fallback fonts for a `|`-joined list of language tags.
    pub async fn fonts(&self, code: &str) -> Vec<FontFace> {
        let wanted = self.catalog.resolve(code);
        if wanted.is_empty() {
            debug!("No fallback font for {:?}", code);
            return Vec::new();
        }

        let loads = wanted.into_iter().map(move |(font, lang)| async move {
            let path = self.font_dir.join(format!("{}.{}", font, self.font_extension));
            let data = self
                .cache
                .memoize(AssetKey::font(&path), move || read_asset("font", path))
                .await?;
            Some(FontFace {
                name: format!("fallback-{}-{}", lang, font),
                data,
                weight: 400,
                style: FontStyle::Normal,
                lang,
            })
        });

        join_all(loads).await.into_iter().flatten().collect()
    }
}

impl AssetLoader for AssetResolver {
    fn resolve<'a>(&'a self, code: &'a str, text: &'a str) -> BoxFuture<'a, ResolvedAsset> {
        AssetResolver::resolve(self, code, text).boxed()
    }
}
