use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

use crate::types::SettingType;

pub const MAX_LABEL_LEN: usize = 70;
const MAX_SCHEMA_NAME_LEN: usize = 25;
const ELLIPSIS: &str = "...";

pub fn normalize_whitespace(input: &str) -> String {
    let cleaned = input
        .replace('\u{00A0}', " ")
        .replace(['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn contains_liquid(input: &str) -> bool {
    input.contains("{{") || input.contains("{%") || input.contains("}}") || input.contains("%}")
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Minimal richtext: one `<p>` per paragraph, text escaped.
pub fn richtext<S: AsRef<str>>(paragraphs: &[S]) -> String {
    paragraphs
        .iter()
        .map(|p| normalize_whitespace(p.as_ref()))
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(&p)))
        .collect()
}

/// Filename slug: lowercase `[a-z0-9-_]`, hyphens collapsed and trimmed.
pub fn normalize_slug(name: &str) -> String {
    let trimmed = name.trim();
    let lower = trimmed.to_lowercase();
    let stem = [".html", ".htm", ".liquid"]
        .iter()
        .find_map(|ext| lower.strip_suffix(ext))
        .unwrap_or(&lower);
    let mut out = String::with_capacity(stem.len());
    for ch in stem.chars() {
        let mapped = if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            ch
        } else {
            '-'
        };
        if mapped == '-' && out.ends_with('-') {
            continue;
        }
        out.push(mapped);
    }
    let out = out.trim_matches('-').to_string();
    if out.is_empty() {
        "section".to_string()
    } else {
        out
    }
}

/// Identifier for block types and setting ids: `[a-z0-9_]`.
pub fn setting_key(input: &str) -> String {
    let mut out = String::new();
    for ch in input.trim().to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            out.push(ch);
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

pub fn title_case(slug: &str) -> String {
    slug.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn schema_title(slug: &str) -> String {
    let title = title_case(slug);
    let title = if title.is_empty() { "Section".to_string() } else { title };
    title
        .graphemes(true)
        .take(MAX_SCHEMA_NAME_LEN)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Labels longer than 70 graphemes are cut on a word boundary and end with "...".
pub fn truncate_label(label: &str) -> String {
    let label = normalize_whitespace(label);
    if label.graphemes(true).count() <= MAX_LABEL_LEN {
        return label;
    }
    let budget = MAX_LABEL_LEN - ELLIPSIS.len();
    let head: String = label.graphemes(true).take(budget).collect();
    let cut = match head.rfind(' ') {
        Some(pos) if pos > 0 => &head[..pos],
        _ => head.as_str(),
    };
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

/// Short excerpt of visible text for use inside a label.
pub fn snippet(text: &str, words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().take(words).collect();
    words.join(" ")
}

pub fn clamp_rating(value: f64) -> f64 {
    if !value.is_finite() {
        return 5.0;
    }
    let clamped = value.clamp(1.0, 5.0);
    (clamped * 10.0).round() / 10.0
}

/// Type-appropriate default; empty values fall back to a neutral value and
/// values carrying template syntax are replaced by the fallback.
pub fn sanitize_default(kind: SettingType, value: Option<&str>, fallback: &str) -> Value {
    let cleaned = value.map(|v| v.trim().to_string()).unwrap_or_default();
    let cleaned = if contains_liquid(&cleaned) {
        String::new()
    } else {
        cleaned
    };
    match kind {
        SettingType::Url => {
            if cleaned.is_empty() || cleaned == "#" || cleaned.starts_with("javascript:") {
                Value::String("/".to_string())
            } else {
                Value::String(cleaned)
            }
        }
        SettingType::Richtext => {
            if cleaned.is_empty() {
                Value::String(richtext(&[fallback]))
            } else {
                Value::String(cleaned)
            }
        }
        SettingType::Range | SettingType::Number => {
            let n = cleaned.parse::<f64>().unwrap_or(5.0);
            serde_json::json!(clamp_rating(n))
        }
        SettingType::Checkbox => Value::Bool(cleaned.eq_ignore_ascii_case("true")),
        _ => {
            let text = normalize_whitespace(&cleaned);
            if text.is_empty() {
                Value::String(fallback.to_string())
            } else {
                Value::String(text)
            }
        }
    }
}

/// True when `href` points somewhere real.
pub fn is_real_link(href: &str) -> bool {
    let href = href.trim();
    !(href.is_empty()
        || href == "#"
        || href.starts_with("javascript:")
        || contains_liquid(href))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_normalizes_names() {
        assert_eq!(normalize_slug("About Us.html"), "about-us");
        assert_eq!(normalize_slug("  --Summer__Collection!!  "), "summer__collection");
        assert_eq!(normalize_slug("Ünïcode page"), "n-code-page");
        assert_eq!(normalize_slug("!!!"), "section");
    }

    #[test]
    fn slug_is_idempotent() {
        for name in [
            "About Us.html",
            "a--b",
            "-x-",
            "Shop.HTM",
            "über/straße 2",
            "",
            "section",
            "landing_page.liquid",
        ] {
            let once = normalize_slug(name);
            assert_eq!(normalize_slug(&once), once, "{name}");
        }
    }

    #[test]
    fn labels_truncate_on_word_boundary() {
        let long = "word ".repeat(30);
        let label = truncate_label(&long);
        assert!(label.ends_with("..."));
        assert!(label.graphemes(true).count() <= MAX_LABEL_LEN);
        assert!(!label.contains("wor..."));
        assert_eq!(truncate_label("Short label"), "Short label");
    }

    #[test]
    fn defaults_drop_template_syntax() {
        let v = sanitize_default(SettingType::Text, Some("Hi {{ customer.name }}"), "Heading");
        assert_eq!(v, Value::String("Heading".into()));
        let v = sanitize_default(SettingType::Url, Some(""), "");
        assert_eq!(v, Value::String("/".into()));
        let v = sanitize_default(SettingType::Url, Some("#"), "");
        assert_eq!(v, Value::String("/".into()));
    }

    #[test]
    fn rating_is_clamped_to_one_decimal() {
        assert_eq!(clamp_rating(7.0), 5.0);
        assert_eq!(clamp_rating(0.0), 1.0);
        assert_eq!(clamp_rating(4.44), 4.4);
    }

    #[test]
    fn richtext_escapes_text() {
        assert_eq!(richtext(&["a < b", " ", "c"]), "<p>a &lt; b</p><p>c</p>");
    }
}
