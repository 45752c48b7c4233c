use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine as Base64Engine;
use pollframe::assets::{AssetCache, AssetResolver, ResolvedAsset, SharedAssetCache};
use pollframe::RenderConfig;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_config() -> RenderConfig {
    RenderConfig {
        font_dir: fixtures().join("fonts"),
        emoji_dir: fixtures().join("emojis"),
        ..Default::default()
    }
}

fn resolver(config: &RenderConfig) -> AssetResolver {
    let cache: SharedAssetCache = Arc::new(AssetCache::new());
    AssetResolver::new(config, cache)
}

#[tokio::test]
async fn emoji_in_store_resolves_to_svg_data_url() {
    let r = resolver(&fixture_config());
    let got = r.resolve("emoji", "\u{2764}\u{fe0f}").await;

    let url = match got {
        ResolvedAsset::Image(url) => url,
        other => panic!("expected image, got {:?}", other),
    };
    let prefix = "data:image/svg+xml;base64,";
    assert!(url.starts_with(prefix));

    let svg = base64::engine::general_purpose::STANDARD
        .decode(&url[prefix.len()..])
        .expect("valid base64");
    let on_disk = std::fs::read(fixtures().join("emojis/2764_fe0f.svg")).unwrap();
    assert_eq!(svg, on_disk);
}

#[tokio::test]
async fn missing_emoji_is_empty_not_an_error() {
    let r = resolver(&fixture_config());
    let got = r.resolve("emoji", "\u{1F984}").await;
    assert_eq!(got, ResolvedAsset::Empty);
    assert!(got.is_empty());
}

#[tokio::test]
async fn missing_emoji_directory_is_empty() {
    let config = RenderConfig {
        emoji_dir: fixtures().join("does-not-exist"),
        ..fixture_config()
    };
    assert!(resolver(&config).resolve("emoji", "\u{1F622}").await.is_empty());
}

#[tokio::test]
async fn font_tags_resolve_to_tagged_fonts() {
    let r = resolver(&fixture_config());
    let fonts = match r.resolve("ja-JP|symbol", "日本★").await {
        ResolvedAsset::Fonts(fonts) => fonts,
        other => panic!("expected fonts, got {:?}", other),
    };

    // NotoSansSymbols2 has no fixture file and is skipped.
    let summary: Vec<(&str, &[u8])> = fonts.iter().map(|f| (f.lang.as_str(), &*f.data)).collect();
    assert_eq!(
        summary,
        vec![
            ("ja-JP", b"fixture-font:NotoSansJP".as_slice()),
            ("symbol", b"fixture-font:NotoSansSymbols".as_slice()),
        ]
    );
    assert!(fonts.iter().all(|f| f.weight == 400));
}

#[tokio::test]
async fn duplicate_tags_load_one_font() {
    let r = resolver(&fixture_config());
    match r.resolve("ja-JP|ja-JP", "日本").await {
        ResolvedAsset::Fonts(fonts) => assert_eq!(fonts.len(), 1),
        other => panic!("expected fonts, got {:?}", other),
    }
}

#[tokio::test]
async fn unmapped_tags_yield_empty_font_list() {
    let r = resolver(&fixture_config());
    assert_eq!(r.resolve("tlh", "qapla'").await, ResolvedAsset::Fonts(Vec::new()));
}

#[tokio::test]
async fn assets_are_read_from_disk_at_most_once() {
    let dir = tempfile::tempdir().unwrap();
    let emoji_dir = dir.path().join("emojis");
    let font_dir = dir.path().join("fonts");
    std::fs::create_dir_all(&emoji_dir).unwrap();
    std::fs::create_dir_all(&font_dir).unwrap();
    std::fs::write(emoji_dir.join("1f622.svg"), "<svg/>").unwrap();
    std::fs::write(font_dir.join("NotoSansKR.ttf"), "kr").unwrap();

    let config = RenderConfig { emoji_dir: emoji_dir.clone(), font_dir: font_dir.clone(), ..Default::default() };
    let r = resolver(&config);

    let first_emoji = r.resolve("emoji", "\u{1F622}").await;
    let first_font = r.resolve("ko-KR", "한").await;
    assert!(!first_emoji.is_empty());
    assert!(!first_font.is_empty());

    // Remove the store; cached entries must still be served.
    std::fs::remove_file(emoji_dir.join("1f622.svg")).unwrap();
    std::fs::remove_file(font_dir.join("NotoSansKR.ttf")).unwrap();

    assert_eq!(r.resolve("emoji", "\u{1F622}").await, first_emoji);
    assert_eq!(r.resolve("ko-KR", "국").await, first_font);
    assert_eq!(r.cache().len(), 2);
}

#[tokio::test]
async fn resolvers_sharing_a_cache_share_reads() {
    let cache: SharedAssetCache = Arc::new(AssetCache::new());
    let config = fixture_config();
    let a = AssetResolver::new(&config, cache.clone());
    let b = AssetResolver::new(&config, cache.clone());

    let (x, y) = tokio::join!(a.resolve("emoji", "\u{1F622}"), b.resolve("emoji", "\u{1F622}"));
    assert_eq!(x, y);
    assert!(!x.is_empty());
    assert_eq!(cache.len(), 1);
}
