//! Asset resolution for the renderer: fallback fonts and emoji icons,
//! read from disk at most once per process.

pub mod cache;
pub mod catalog;
pub mod resolver;

pub use cache::AssetCache;
pub use catalog::FontCatalog;
pub use resolver::{
    emoji_key, AssetKey, AssetKind, AssetLoader, AssetResolver, FontFace, FontStyle,
    ResolvedAsset, SharedAssetCache, EMOJI_CODE,
};
