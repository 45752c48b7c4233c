//! Language/script tag to fallback font mapping.

/// Fallback fonts per language or script tag, in preference order.
const FONT_TABLE: &[(&str, &[&str])] = &[
    ("ja-JP", &["NotoSansJP"]),
    ("ko-KR", &["NotoSansKR"]),
    ("zh-CN", &["NotoSansSC"]),
    ("zh-TW", &["NotoSansTC"]),
    ("zh-HK", &["NotoSansHK"]),
    ("th-TH", &["NotoSansThai"]),
    ("bn-IN", &["NotoSansBengali"]),
    ("ar-AR", &["NotoSansArabic"]),
    ("ta-IN", &["NotoSansTamil"]),
    ("ml-IN", &["NotoSansMalayalam"]),
    ("he-IL", &["NotoSansHebrew"]),
    ("te-IN", &["NotoSansTelugu"]),
    ("devanagari", &["NotoSansDevanagari"]),
    ("kannada", &["NotoSansKannada"]),
    ("symbol", &["NotoSansSymbols", "NotoSansSymbols2"]),
    ("math", &["NotoSansMath"]),
    ("unknown", &["NotoSans"]),
];

/// Static mapping from language/script tags to font identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontCatalog;

impl FontCatalog {
    pub fn new() -> Self {
        FontCatalog
    }

    /// Font identifiers for one tag; empty for tags the catalog does not know.
    pub fn fonts_for(&self, tag: &str) -> &'static [&'static str] {
        FONT_TABLE
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, fonts)| *fonts)
            .unwrap_or(&[])
    }

    /// Every known tag.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> {
        FONT_TABLE.iter().map(|(t, _)| *t)
    }

    /// Resolve a `|`-joined tag list into unique `(font, originating tag)`
    /// pairs. The first tag that names a font wins.
    pub fn resolve(&self, code: &str) -> Vec<(&'static str, String)> {
        let mut out: Vec<(&'static str, String)> = Vec::new();
        for tag in code.split('|').map(str::trim).filter(|t| !t.is_empty()) {
            for font in self.fonts_for(tag) {
                if !out.iter().any(|(f, _)| f == font) {
                    out.push((*font, tag.to_string()));
                }
            }
        }
        out
    }
}
