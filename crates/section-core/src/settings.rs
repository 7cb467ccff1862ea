use std::collections::BTreeMap;

use kuchiki::NodeRef;
use serde_json::Value;
use tracing::{debug, warn};

use crate::blocks::image_src_liquid;
use crate::config::ConvertOptions;
use crate::dom;
use crate::error::ConvertError;
use crate::text::{contains_liquid, is_real_link, richtext, sanitize_default, snippet};
use crate::types::{SchemaSetting, SettingType};

const NAV_CONTAINERS: &str = "header, nav, .navbar, .site-header";
const NAV_TITLES: &str = ".logo, .navbar-brand, .brand, .site-title, h1, h2, h3, h4, h5, h6";
const LOGO_HINTS: &[&str] = &["logo", "brand"];
const PAGE_IMAGE_WIDTH: u32 = 1200;
const BACKGROUND_WIDTH: u32 = 1920;

/// Page-level settings plus a per-stem sequence for unique ids.
#[derive(Debug)]
pub struct SettingScope {
    settings: Vec<SchemaSetting>,
    counters: BTreeMap<String, usize>,
}

impl Default for SettingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingScope {
    pub fn new() -> Self {
        Self {
            settings: vec![
                SchemaSetting::color("background_color", "Background color"),
                SchemaSetting::color("text_color", "Text color"),
            ],
            counters: BTreeMap::new(),
        }
    }

    /// Next 1-based index for `stem`.
    pub fn next_index(&mut self, stem: &str) -> usize {
        let counter = self.counters.entry(stem.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn has(&self, id: &str) -> bool {
        self.settings.iter().any(|s| s.id == id)
    }

    pub fn push(&mut self, setting: SchemaSetting) {
        if self.has(&setting.id) {
            debug!(id = %setting.id, "duplicate setting id ignored");
            return;
        }
        self.settings.push(setting);
    }

    pub(crate) fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn into_settings(self) -> Vec<SchemaSetting> {
        self.settings
    }
}

#[derive(Debug, Default)]
pub struct SettingsPass {
    pub settings: Vec<SchemaSetting>,
    pub changes: Vec<String>,
    pub warnings: Vec<String>,
}

struct Sweep<'a> {
    root: &'a NodeRef,
    regions: &'a [NodeRef],
    options: &'a ConvertOptions,
}

impl Sweep<'_> {
    /// Outside every block region and not yet bound.
    fn eligible(&self, node: &NodeRef) -> bool {
        !dom::is_within_any(node, self.regions) && !dom::text(node).contains("{{")
    }
}

type SweepFn = fn(&Sweep<'_>, &mut SettingScope) -> Result<(), ConvertError>;

fn section_ref(id: &str) -> String {
    format!("{{{{ section.settings.{id} }}}}")
}

fn text_default(value: &str, fallback: &str) -> Value {
    sanitize_default(SettingType::Text, Some(value), fallback)
}

fn nav_sweep(sweep: &Sweep<'_>, scope: &mut SettingScope) -> Result<(), ConvertError> {
    let containers: Vec<NodeRef> = dom::select_all(sweep.root, NAV_CONTAINERS)?
        .into_iter()
        .filter(|c| !dom::is_within_any(c, sweep.regions))
        .collect();
    for container in &containers {
        for title in dom::select_all(container, NAV_TITLES)? {
            let text = dom::text(&title);
            if text.is_empty() || !sweep.eligible(&title) || dom::select_first(&title, "img").is_some() {
                continue;
            }
            let id = format!("nav_title_{}", scope.next_index("nav_title"));
            scope.push(SchemaSetting::new(SettingType::Text, &id, "Navigation title").with_default(text_default(&text, "")));
            dom::set_text(&title, &section_ref(&id));
        }
        for anchor in dom::select_all(container, "a")? {
            let text = dom::text(&anchor);
            if text.is_empty() || !sweep.eligible(&anchor) {
                continue;
            }
            let n = scope.next_index("nav_link");
            let text_id = format!("nav_link_{n}_text");
            let url_id = format!("nav_link_{n}_url");
            let href = dom::attr(&anchor, "href").unwrap_or_default();
            scope.push(
                SchemaSetting::new(SettingType::Text, &text_id, &format!("Navigation link {n} label"))
                    .with_default(text_default(&text, "")),
            );
            scope.push(
                SchemaSetting::new(SettingType::Url, &url_id, &format!("Navigation link {n} URL"))
                    .with_default(sanitize_default(SettingType::Url, Some(&href), "")),
            );
            dom::set_text(&anchor, &section_ref(&text_id));
            dom::set_attr(&anchor, "href", &section_ref(&url_id));
        }
    }
    Ok(())
}

fn heading_sweep(sweep: &Sweep<'_>, scope: &mut SettingScope) -> Result<(), ConvertError> {
    for heading in dom::select_all(sweep.root, "h1, h2, h3, h4, h5, h6")? {
        let text = dom::text(&heading);
        if text.is_empty() || !sweep.eligible(&heading) {
            continue;
        }
        let n = scope.next_index("heading");
        let id = format!("heading_{n}");
        scope.push(
            SchemaSetting::new(SettingType::Text, &id, &format!("Heading {n}: {}", snippet(&text, 6)))
                .with_default(text_default(&text, "Heading")),
        );
        dom::set_text(&heading, &section_ref(&id));
    }
    Ok(())
}

fn paragraph_sweep(sweep: &Sweep<'_>, scope: &mut SettingScope) -> Result<(), ConvertError> {
    for paragraph in dom::select_all(sweep.root, "p")? {
        let text = dom::text(&paragraph);
        if text.chars().count() <= sweep.options.paragraph_min_chars || !sweep.eligible(&paragraph) {
            continue;
        }
        if contains_liquid(&text) {
            continue;
        }
        let n = scope.next_index("text");
        let id = format!("text_{n}");
        scope.push(SchemaSetting::richtext(&id, &format!("Text {n}: {}", snippet(&text, 6)), &richtext(&[&text])));
        if let Some(div) = dom::retag(&paragraph, "div") {
            div.append(NodeRef::new_text(section_ref(&id)));
        }
    }
    Ok(())
}

fn button_sweep(sweep: &Sweep<'_>, scope: &mut SettingScope) -> Result<(), ConvertError> {
    for button in dom::select_all(sweep.root, "a, button")? {
        let text = dom::text(&button);
        if text.is_empty() || !sweep.eligible(&button) {
            continue;
        }
        let n = scope.next_index("button");
        let text_id = format!("button_{n}_text");
        scope.push(
            SchemaSetting::new(SettingType::Text, &text_id, &format!("Button {n} label"))
                .with_default(text_default(&text, "Button")),
        );
        dom::set_text(&button, &section_ref(&text_id));
        let href = dom::attr(&button, "href").unwrap_or_default();
        if dom::is_tag(&button, &["a"]) && is_real_link(&href) {
            let url_id = format!("button_{n}_url");
            scope.push(
                SchemaSetting::new(SettingType::Url, &url_id, &format!("Button {n} link"))
                    .with_default(sanitize_default(SettingType::Url, Some(&href), "")),
            );
            dom::set_attr(&button, "href", &section_ref(&url_id));
        }
    }
    Ok(())
}

fn is_logo(img: &NodeRef) -> bool {
    let hint = |v: Option<String>| v.is_some_and(|v| v.to_lowercase().contains("logo"));
    dom::class_contains(img, "logo")
        || hint(dom::attr(img, "alt"))
        || hint(dom::attr(img, "src"))
        || img
            .ancestors()
            .any(|a| LOGO_HINTS.iter().any(|hint| dom::class_contains(&a, hint)))
}

fn image_sweep(sweep: &Sweep<'_>, scope: &mut SettingScope) -> Result<(), ConvertError> {
    for img in dom::select_all(sweep.root, "img")? {
        let Some(src) = dom::attr(&img, "src").filter(|s| !s.trim().is_empty() && !contains_liquid(s)) else {
            continue;
        };
        if dom::is_within_any(&img, sweep.regions) || is_logo(&img) {
            continue;
        }
        let n = scope.next_index("image");
        let id = format!("image_{n}");
        scope.push(SchemaSetting::image(&id, &format!("Image {n}")));
        dom::set_attr(&img, "src", &image_src_liquid("section", &id, src.trim(), PAGE_IMAGE_WIDTH));
        dom::remove_attr(&img, "srcset");
        let alt = dom::attr(&img, "alt").unwrap_or_default();
        if !alt.trim().is_empty() {
            let alt_id = format!("{id}_alt");
            scope.push(
                SchemaSetting::new(SettingType::Text, &alt_id, &format!("Image {n} alt text"))
                    .with_default(text_default(&alt, "")),
            );
            dom::set_attr(&img, "alt", &format!("{{{{ section.settings.{alt_id} | escape }}}}"));
        }
    }
    Ok(())
}

fn background_role(node: &NodeRef) -> Option<&'static str> {
    let mut hints = dom::classes(node).join(" ");
    if let Some(heading) = dom::select_first(node, "h1, h2") {
        hints.push(' ');
        hints.push_str(&dom::text(&heading).to_lowercase());
    }
    if hints.contains("hero") || hints.contains("banner") || dom::select_first(node, "h1").is_some() {
        Some("hero_background_image")
    } else if hints.contains("shop") || hints.contains("collection") || hints.contains("product") {
        Some("shop_background_image")
    } else {
        None
    }
}

fn background_sweep(sweep: &Sweep<'_>, scope: &mut SettingScope) -> Result<(), ConvertError> {
    for node in dom::select_all(sweep.root, "[style*=background]")? {
        if dom::is_within_any(&node, sweep.regions) {
            continue;
        }
        let Some(style) = dom::attr(&node, "style") else {
            continue;
        };
        let Some(url) = dom::background_url(&style).filter(|u| !contains_liquid(u)) else {
            continue;
        };
        let id = match background_role(&node) {
            Some(named) if !scope.has(named) => named.to_string(),
            _ => format!("background_image_{}", scope.next_index("background_image")),
        };
        scope.push(SchemaSetting::image(&id, "Background image"));
        let liquid = image_src_liquid("section", &id, &url, BACKGROUND_WIDTH);
        dom::set_attr(&node, "style", &dom::replace_background_url(&style, &liquid));
    }
    Ok(())
}

/// Lifts standalone content outside `regions` into page-level settings.
/// Navigation runs first so its titles and links are not counted again as
/// generic headings or buttons.
pub fn extract_section_settings(
    root: &NodeRef,
    regions: &[NodeRef],
    options: &ConvertOptions,
    seed: Vec<SchemaSetting>,
) -> SettingsPass {
    let mut scope = SettingScope::new();
    for setting in seed {
        scope.push(setting);
    }
    let before = scope.len();
    let sweep = Sweep { root, regions, options };
    let sweeps: [(&str, SweepFn); 6] = [
        ("navigation", nav_sweep),
        ("headings", heading_sweep),
        ("paragraphs", paragraph_sweep),
        ("buttons", button_sweep),
        ("images", image_sweep),
        ("backgrounds", background_sweep),
    ];

    let mut pass = SettingsPass::default();
    for (name, run) in sweeps {
        let start = scope.len();
        match run(&sweep, &mut scope) {
            Ok(()) => debug!(sweep = name, added = scope.len() - start, "settings sweep done"),
            Err(err) => {
                warn!(sweep = name, %err, "settings sweep skipped");
                pass.warnings.push(format!("Settings sweep '{name}' skipped: {err}"));
            }
        }
    }
    let added = scope.len() - before;
    if added > 0 {
        pass.changes.push(format!("Extracted {added} page-level settings"));
    }
    pass.settings = scope.into_settings();
    pass
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> (NodeRef, SettingsPass) {
        let doc = dom::parse_document(html);
        let body = dom::body(&doc);
        let pass = extract_section_settings(&body, &[], &ConvertOptions::default(), Vec::new());
        (body, pass)
    }

    fn ids(pass: &SettingsPass) -> Vec<&str> {
        pass.settings.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn nav_runs_before_headings_and_buttons() {
        let (body, pass) = run(
            r#"<nav><span class="logo">Shop</span><a href="/about">About</a></nav><h1>Welcome</h1><a href="/buy">Buy now</a>"#,
        );
        assert_eq!(
            ids(&pass),
            vec![
                "background_color",
                "text_color",
                "nav_title_1",
                "nav_link_1_text",
                "nav_link_1_url",
                "heading_1",
                "button_1_text",
                "button_1_url",
            ]
        );
        assert!(dom::inner_html(&body).contains("<h1>{{ section.settings.heading_1 }}</h1>"));
    }

    #[test]
    fn short_paragraphs_stay_literal() {
        let (body, pass) = run("<p>Too short</p><p>This one is long enough to keep.</p>");
        assert_eq!(ids(&pass)[2..], ["text_1"]);
        let html = dom::inner_html(&body);
        assert!(html.contains("<p>Too short</p>"));
        assert!(html.contains("<div>{{ section.settings.text_1 }}</div>"));
    }

    #[test]
    fn placeholder_links_get_no_url_setting() {
        let (_, pass) = run(r##"<a href="#">Open</a><button>Send</button>"##);
        assert_eq!(ids(&pass)[2..], ["button_1_text", "button_2_text"]);
    }

    #[test]
    fn images_skip_logos_and_keep_literal_fallback() {
        let (body, pass) = run(r#"<img src="/logo.png"><img src="/hero.jpg" alt="Hero shot">"#);
        assert_eq!(ids(&pass)[2..], ["image_1", "image_1_alt"]);
        let html = dom::inner_html(&body);
        assert!(html.contains("{% else %}/hero.jpg{% endif %}"), "{html}");
    }

    #[test]
    fn hero_background_gets_named_field() {
        let (body, pass) = run(
            r#"<section class="hero" style="background-image: url('/bg.jpg')"><div class="promo" style="background: url(/b2.jpg)"></div></section>"#,
        );
        assert_eq!(ids(&pass)[2..], ["hero_background_image", "background_image_1"]);
        assert!(dom::inner_html(&body).contains("section.settings.hero_background_image"));
    }

    #[test]
    fn block_regions_are_left_alone() {
        let doc = dom::parse_document(r#"<div id="b"><h2>Inside</h2></div><h2>Outside</h2>"#);
        let region = dom::select_first(&doc, "#b").expect("region");
        let pass = extract_section_settings(&dom::body(&doc), &[region], &ConvertOptions::default(), Vec::new());
        assert_eq!(pass.settings.len(), 3);
    }
}
