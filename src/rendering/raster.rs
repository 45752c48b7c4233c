//! Deterministic text-mode renderer.
//!
//! Lays the scene out as monospace lines and asks the asset loader for every
//! emoji cluster and non-Latin script run, the same way a raster engine
//! would while shaping text. Unresolved emoji are dropped from the output.

use futures::future::{BoxFuture, FutureExt};
use log::debug;

use crate::assets::{AssetLoader, ResolvedAsset, EMOJI_CODE};
use crate::rendering::scene::{Axis, Background, Scene, SceneNode, Weight};
use crate::rendering::tally::bar_glyphs;
use crate::rendering::{FrameImage, Renderer};
use crate::{Error, Result};

/// A run of text that needs the same kind of asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    Plain(String),
    Emoji(String),
    /// `|`-joined language tags and the text they cover
    Script(&'static str, String),
}

fn is_emoji_base(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2300..=0x23FF | 0x2B50..=0x2B55)
}

fn is_emoji_modifier(c: char) -> bool {
    matches!(c as u32, 0xFE0F | 0x1F3FB..=0x1F3FF | 0xE0020..=0xE007F | 0x20E3)
}

fn is_regional_indicator(c: char) -> bool {
    matches!(c as u32, 0x1F1E6..=0x1F1FF)
}

/// Length of a keycap sequence (`1⃣`, `1️⃣`) starting at `i`.
fn keycap_len(chars: &[char], i: usize) -> Option<usize> {
    if !matches!(chars[i], '0'..='9' | '#' | '*') {
        return None;
    }
    match (chars.get(i + 1), chars.get(i + 2)) {
        (Some('\u{20E3}'), _) => Some(2),
        (Some('\u{FE0F}'), Some('\u{20E3}')) => Some(3),
        _ => None,
    }
}

/// Pictographs with text default presentation become emoji when followed by
/// VS16 (`▶️`, `©️`, `‼️`).
fn starts_cluster(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    is_emoji_base(c)
        || (!c.is_ascii() && !is_emoji_modifier(c) && chars.get(i + 1) == Some(&'\u{FE0F}'))
}

/// Language tags for a character outside the default font's coverage.
pub fn script_tags(c: char) -> Option<&'static str> {
    let tags = match c as u32 {
        0x0000..=0x024F => return None,
        0x3040..=0x30FF | 0x31F0..=0x31FF => "ja-JP",
        0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF => "ko-KR",
        0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF => "zh-CN|ja-JP",
        0x0E00..=0x0E7F => "th-TH",
        0x0600..=0x06FF | 0x0750..=0x077F | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF => "ar-AR",
        0x0590..=0x05FF => "he-IL",
        0x0900..=0x097F => "devanagari",
        0x0980..=0x09FF => "bn-IN",
        0x0B80..=0x0BFF => "ta-IN",
        0x0C00..=0x0C7F => "te-IN",
        0x0C80..=0x0CFF => "kannada",
        0x0D00..=0x0D7F => "ml-IN",
        0x2200..=0x22FF | 0x27C0..=0x27EF | 0x2980..=0x2AFF | 0x1D400..=0x1D7FF => "math",
        0x2190..=0x21FF | 0x2500..=0x25FF | 0x2B00..=0x2B4F => "symbol",
        // punctuation and spacing blocks the default font covers
        0x2000..=0x206F | 0x20A0..=0x20CF => return None,
        _ => "unknown",
    };
    Some(tags)
}

fn push_char(runs: &mut Vec<Run>, c: char) {
    match (runs.last_mut(), script_tags(c)) {
        (Some(Run::Plain(s)), None) => s.push(c),
        (Some(Run::Script(tags, s)), Some(t)) if *tags == t => s.push(c),
        (_, None) => runs.push(Run::Plain(c.to_string())),
        (_, Some(t)) => runs.push(Run::Script(t, c.to_string())),
    }
}

/// Split a line into plain, emoji-cluster and script runs.
pub fn segment(text: &str) -> Vec<Run> {
    let chars: Vec<char> = text.chars().collect();
    let mut runs: Vec<Run> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if let Some(len) = keycap_len(&chars, i) {
            runs.push(Run::Emoji(chars[i..i + len].iter().collect()));
            i += len;
            continue;
        }
        if !starts_cluster(&chars, i) {
            push_char(&mut runs, chars[i]);
            i += 1;
            continue;
        }

        let start = i;
        i += 1;
        if is_regional_indicator(chars[start]) && matches!(chars.get(i), Some(&c) if is_regional_indicator(c)) {
            i += 1;
        }
        loop {
            match chars.get(i) {
                Some(&m) if is_emoji_modifier(m) => i += 1,
                Some('\u{200D}') => {
                    i += 1;
                    if i < chars.len() && starts_cluster(&chars, i) {
                        i += 1;
                    }
                }
                _ => break,
            }
        }
        runs.push(Run::Emoji(chars[start..i].iter().collect()));
    }
    runs
}

fn layout_node(node: &SceneNode, lines: &mut Vec<String>) {
    match node {
        SceneNode::Stack { axis: Axis::Column, children } => {
            for child in children {
                layout_node(child, lines);
            }
        }
        SceneNode::Stack { axis: Axis::Row, children } => {
            let mut cells = Vec::new();
            for child in children {
                let mut inner = Vec::new();
                layout_node(child, &mut inner);
                cells.push(inner.join(" "));
            }
            lines.push(cells.join(" | "));
        }
        SceneNode::Text { text, size, weight, .. } => {
            let mark = match weight {
                Weight::Normal => "",
                Weight::Bold => "*",
                Weight::Black => "**",
            };
            lines.push(format!("[{}px] {}{}{}", size, mark, text, mark));
        }
        SceneNode::List { size, items } => {
            for item in items {
                lines.push(format!("[{}px] ({}) {}", size, item.marker, item.label));
            }
        }
        SceneNode::BarRow { marker, label, size, bar, .. } => {
            lines.push(format!("[{}px] {} - {}", size, marker, label));
            lines.push(bar_glyphs(bar.percent, bar.total_steps));
        }
        SceneNode::Stat { caption, value, detail } => match detail {
            Some(d) => lines.push(format!("{}: {} {}", caption, value, d)),
            None => lines.push(format!("{}: {}", caption, value)),
        },
        SceneNode::Badge { text, .. } => lines.push(format!("<{}>", text)),
        SceneNode::NoResults { text } => lines.push(text.clone()),
        SceneNode::Footer { text, brand } => lines.push(format!("{} {}", text, brand)),
    }
}

/// Plain text lines for a scene, before any asset resolution.
pub fn layout(scene: &Scene) -> Vec<String> {
    let mut lines = vec![format!("{}x{}", scene.width, scene.height)];
    if let Background::Picture { asset } = &scene.background {
        lines.push(format!("[background {}]", asset));
    }
    layout_node(&scene.root, &mut lines);
    lines
}

/// Renders scenes as UTF-8 text "images".
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl TextRenderer {
    pub fn new() -> Self {
        TextRenderer
    }

    async fn shape(&self, line: &str, assets: &dyn AssetLoader) -> String {
        let mut out = String::with_capacity(line.len());
        for run in segment(line) {
            match run {
                Run::Plain(text) => out.push_str(&text),
                Run::Script(tags, text) => {
                    // Text output has no glyphs to shape; resolving still
                    // loads and caches the fallback fonts.
                    if let ResolvedAsset::Fonts(fonts) = assets.resolve(tags, &text).await {
                        debug!("{} fallback font(s) for {} run {:?}", fonts.len(), tags, text);
                    }
                    out.push_str(&text);
                }
                Run::Emoji(cluster) => match assets.resolve(EMOJI_CODE, &cluster).await {
                    ResolvedAsset::Image(url) if !url.is_empty() => out.push_str(&cluster),
                    _ => {}
                },
            }
        }
        out
    }
}

impl Renderer for TextRenderer {
    fn render<'a>(
        &'a self,
        scene: &'a Scene,
        assets: &'a dyn AssetLoader,
    ) -> BoxFuture<'a, Result<FrameImage>> {
        async move {
            if scene.width == 0 || scene.height == 0 {
                return Err(Error::RenderError(format!(
                    "cannot render a {}x{} canvas",
                    scene.width, scene.height
                )));
            }

            let mut text = String::new();
            for line in layout(scene) {
                text.push_str(&self.shape(&line, assets).await);
                text.push('\n');
            }

            Ok(FrameImage {
                width: scene.width,
                height: scene.height,
                content_type: "text/plain; charset=utf-8".to_string(),
                data: text.into_bytes(),
            })
        }
        .boxed()
    }
}
