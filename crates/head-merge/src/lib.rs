use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub const FONTS_HEADER: &str = "<!-- Fonts -->";
pub const LIBRARIES_HEADER: &str = "<!-- Libraries -->";
pub const OTHER_HEADER: &str = "<!-- Other -->";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontSource {
    Hosted,
    Kit,
    File,
    FontAwesome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeadResource {
    Font { source: FontSource, family: String },
    Library { name: String, version: String },
    Other,
}

struct LibrarySignature {
    name: &'static str,
    pattern: Regex,
}

fn library(name: &'static str, token: &str) -> LibrarySignature {
    let pattern = format!(
        r"(?i)\b{}(?:[@/\-]v?|\.)?(\d+(?:\.\d+)*)?",
        regex::escape(token)
    );
    LibrarySignature {
        name,
        pattern: Regex::new(&pattern).unwrap(),
    }
}

static HOSTED_FAMILY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)fonts\.googleapis\.com/css2?\?(?:[^\x22'\s>]*?[?&;])?family=([^&\x22'\s>:;|]+)")
        .unwrap()
});
static FONT_KIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)use\.typekit\.net/([a-z0-9]+)\.(?:css|js)").unwrap());
static FONT_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([^/\x22'\s=]+)\.(?:woff2?|ttf|otf|eot)\b").unwrap());

// `jquery-ui` must be tried before `jquery`.
static LIBRARIES: Lazy<Vec<LibrarySignature>> = Lazy::new(|| {
    vec![
        library("jquery-ui", "jquery-ui"),
        library("jquery", "jquery"),
        library("bootstrap", "bootstrap"),
        library("swiper", "swiper"),
        library("slick", "slick"),
        library("aos", "aos"),
        library("gsap", "gsap"),
        library("alpinejs", "alpinejs"),
        library("vue", "vue"),
        library("react", "react"),
        library("lodash", "lodash"),
        library("animate.css", "animate.css"),
        library("tailwindcss", "tailwindcss"),
    ]
});

pub fn classify(line: &str) -> HeadResource {
    if let Some(font) = classify_font(line) {
        return font;
    }
    for sig in LIBRARIES.iter() {
        let mut matched = false;
        let mut version = None;
        for caps in sig.pattern.captures_iter(line) {
            matched = true;
            if let Some(v) = caps.get(1) {
                version = Some(v.as_str().to_string());
                break;
            }
        }
        if matched {
            return HeadResource::Library {
                name: sig.name.to_string(),
                version: version.unwrap_or_else(|| "0".to_string()),
            };
        }
    }
    HeadResource::Other
}

fn classify_font(line: &str) -> Option<HeadResource> {
    if let Some(caps) = HOSTED_FAMILY.captures(line) {
        let family = caps[1].replace('+', " ").replace("%20", " ").to_lowercase();
        return Some(HeadResource::Font {
            source: FontSource::Hosted,
            family,
        });
    }
    if let Some(caps) = FONT_KIT.captures(line) {
        return Some(HeadResource::Font {
            source: FontSource::Kit,
            family: caps[1].to_lowercase(),
        });
    }
    let lower = line.to_lowercase();
    if lower.contains("font-awesome") || lower.contains("fontawesome") || lower.contains("font awesome")
    {
        return Some(HeadResource::Font {
            source: FontSource::FontAwesome,
            family: "font-awesome".to_string(),
        });
    }
    if let Some(caps) = FONT_FILE.captures(line) {
        return Some(HeadResource::Font {
            source: FontSource::File,
            family: caps[1].to_lowercase(),
        });
    }
    None
}

/// Numeric segment-wise comparison; missing or non-numeric segments count as 0.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    fn segments(v: &str) -> Vec<u64> {
        v.split('.')
            .map(|s| {
                let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<u64>().unwrap_or(0)
            })
            .collect()
    }
    let (a, b) = (segments(a), segments(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// What a library line includes; a stylesheet and a script of the same
/// library are kept side by side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Stylesheet,
    Script,
    Other,
}

pub fn asset_kind(line: &str) -> AssetKind {
    let lower = line.trim_start().to_ascii_lowercase();
    if lower.starts_with("<script") {
        AssetKind::Script
    } else if lower.starts_with("<link") || lower.starts_with("<style") {
        AssetKind::Stylesheet
    } else {
        AssetKind::Other
    }
}

struct LibraryEntry {
    name: String,
    kind: AssetKind,
    version: String,
    line: String,
}

#[derive(Default)]
pub struct HeadMerger {
    font_keys: Vec<(FontSource, String)>,
    fonts: Vec<String>,
    libraries: Vec<LibraryEntry>,
    other: Vec<String>,
}

impl HeadMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || is_group_header(line) {
            return;
        }
        match classify(line) {
            HeadResource::Font { source, family } => {
                let key = (source, family);
                if self.font_keys.contains(&key) {
                    debug!(family = %key.1, "duplicate font dropped");
                    return;
                }
                self.font_keys.push(key);
                self.fonts.push(line.to_string());
            }
            HeadResource::Library { name, version } => {
                let kind = asset_kind(line);
                if let Some(existing) = self.libraries.iter_mut().find(|e| e.name == name && e.kind == kind) {
                    if compare_versions(&version, &existing.version) == Ordering::Greater {
                        debug!(library = %name, from = %existing.version, to = %version, "library upgraded");
                        existing.version = version;
                        existing.line = line.to_string();
                    }
                    return;
                }
                self.libraries.push(LibraryEntry {
                    name,
                    kind,
                    version,
                    line: line.to_string(),
                });
            }
            HeadResource::Other => {
                if !self.other.iter().any(|o| o == line) {
                    self.other.push(line.to_string());
                }
            }
        }
    }

    pub fn extend<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            for part in line.as_ref().lines() {
                self.push(part);
            }
        }
    }

    pub fn fonts(&self) -> &[String] {
        &self.fonts
    }

    pub fn libraries(&self) -> Vec<&str> {
        self.libraries.iter().map(|e| e.line.as_str()).collect()
    }

    pub fn other(&self) -> &[String] {
        &self.other
    }

    /// Groups are emitted fonts, libraries, other; an empty group emits nothing.
    pub fn render(&self) -> String {
        let mut out: Vec<&str> = Vec::new();
        if !self.fonts.is_empty() {
            out.push(FONTS_HEADER);
            out.extend(self.fonts.iter().map(String::as_str));
        }
        if !self.libraries.is_empty() {
            out.push(LIBRARIES_HEADER);
            out.extend(self.libraries.iter().map(|e| e.line.as_str()));
        }
        if !self.other.is_empty() {
            out.push(OTHER_HEADER);
            out.extend(self.other.iter().map(String::as_str));
        }
        out.join("\n")
    }
}

fn is_group_header(line: &str) -> bool {
    line == FONTS_HEADER || line == LIBRARIES_HEADER || line == OTHER_HEADER
}

pub fn merge_head_lines<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merger = HeadMerger::new();
    merger.extend(lines);
    merger.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosted_font_family_is_the_key() {
        let line = r#"<link href="https://fonts.googleapis.com/css2?family=Open+Sans:wght@400;700&display=swap" rel="stylesheet">"#;
        assert_eq!(
            classify(line),
            HeadResource::Font {
                source: FontSource::Hosted,
                family: "open sans".into()
            }
        );
    }

    #[test]
    fn font_kit_and_font_awesome_are_fonts() {
        let kit = r#"<link rel="stylesheet" href="https://use.typekit.net/abc1234.css">"#;
        assert!(matches!(
            classify(kit),
            HeadResource::Font { source: FontSource::Kit, ref family } if family == "abc1234"
        ));
        let fa = r#"<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css">"#;
        assert!(matches!(
            classify(fa),
            HeadResource::Font { source: FontSource::FontAwesome, .. }
        ));
    }

    #[test]
    fn library_versions_from_common_cdn_paths() {
        let cases = [
            (r#"<script src="https://code.jquery.com/jquery-3.6.0.min.js"></script>"#, "jquery", "3.6.0"),
            (r#"<script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/js/bootstrap.bundle.min.js"></script>"#, "bootstrap", "5.3.2"),
            (r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/gsap/3.12.2/gsap.min.js"></script>"#, "gsap", "3.12.2"),
            (r#"<script src="/js/swiper-bundle.min.js"></script>"#, "swiper", "0"),
        ];
        for (line, name, version) in cases {
            assert_eq!(
                classify(line),
                HeadResource::Library {
                    name: name.into(),
                    version: version.into()
                },
                "{line}"
            );
        }
    }

    #[test]
    fn jquery_ui_is_not_jquery() {
        let line = r#"<script src="https://code.jquery.com/ui/1.13.2/jquery-ui.min.js"></script>"#;
        assert!(matches!(classify(line), HeadResource::Library { ref name, .. } if name == "jquery-ui"));
    }

    #[test]
    fn compares_versions_segment_wise() {
        assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_versions("2", "2.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("0", "0.1"), Ordering::Less);
    }

    #[test]
    fn equal_library_versions_keep_the_first_line() {
        let a = r#"<script src="https://cdn.example.com/aos@2.3.1/aos.js"></script>"#;
        let b = r#"<script defer src="https://unpkg.com/aos@2.3.1/dist/aos.js"></script>"#;
        let mut merger = HeadMerger::new();
        merger.push(a);
        merger.push(b);
        assert_eq!(merger.libraries(), vec![a]);
    }

    #[test]
    fn empty_groups_are_omitted() {
        let out = merge_head_lines([r#"<link rel="icon" href="/favicon.ico">"#]);
        assert_eq!(out, "<!-- Other -->\n<link rel=\"icon\" href=\"/favicon.ico\">");
        assert_eq!(merge_head_lines(Vec::<String>::new()), "");
    }

    #[test]
    fn merging_merged_output_is_stable() {
        let lines = [
            r#"<link href="https://fonts.googleapis.com/css2?family=Inter&display=swap" rel="stylesheet">"#,
            r#"<script src="https://code.jquery.com/jquery-3.7.1.min.js"></script>"#,
            r##"<meta name="theme-color" content="#000">"##,
        ];
        let once = merge_head_lines(lines);
        let twice = merge_head_lines([once.as_str()]);
        assert_eq!(once, twice);
    }
}
