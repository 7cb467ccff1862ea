mod comparison;
mod footer;
mod generic;
mod header;
mod team;

use kuchiki::NodeRef;
use serde_json::{Map, Value};

use crate::catalog::{BlockPattern, BlockRole};
use crate::dom;
use crate::signals::PRICE_RE;
use crate::text::{contains_liquid, normalize_whitespace, richtext, sanitize_default};
use crate::types::{SchemaBlockDefinition, SettingType};

pub(crate) use comparison::BeforeAfterBlock;
pub(crate) use footer::FooterColumnBlock;
pub(crate) use generic::GenericBlock;
pub(crate) use header::HeaderBlock;
pub(crate) use team::TeamMemberBlock;

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";
const TITLE_FALLBACK: &str = ".title, .name, .card-title";
const SUBHEADING: &str = ".subtitle, .subheading, .tagline, .position, .role, .job-title";
const AUTHOR: &str = "cite, .author, .testimonial-author, .client-name, .reviewer";
const PRICE: &str = ".price, .product-price, .amount, [class*=price]";
const RATING: &str = ".rating, .stars, [data-rating]";
const ICON: &str = "i[class*=fa-], i[class*=icon], span.material-icons, span[class*=icon]";
const BUTTON: &str = "a.btn, a.button, button, .btn, .button, a[class*=btn], a[class*=cta]";

pub(crate) const IMAGE_WIDTH: u32 = 800;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkRef {
    pub text: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SocialLink {
    pub platform: &'static str,
    pub url: String,
}

/// Raw fields captured from one matched element, before sanitization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockInstance {
    pub heading: Option<String>,
    pub subheading: Option<String>,
    pub author: Option<String>,
    /// Already in richtext form.
    pub description: Option<String>,
    pub image: Option<ImageRef>,
    pub images: Vec<ImageRef>,
    pub icon: Option<String>,
    pub button: Option<LinkRef>,
    pub price: Option<String>,
    pub rating: Option<f64>,
    pub background_image: Option<String>,
    pub links: Vec<LinkRef>,
    pub social_links: Vec<SocialLink>,
    pub logo_text: Option<String>,
    pub has_mobile_menu: bool,
    pub labels: (Option<String>, Option<String>),
}

impl BlockInstance {
    /// Stand-in content for block types injected without a source element.
    pub fn sample() -> Self {
        Self {
            heading: Some("Heading".to_string()),
            description: Some(richtext(&["Add a short description."])),
            button: Some(LinkRef {
                text: "Learn more".to_string(),
                url: "/".to_string(),
            }),
            ..Self::default()
        }
    }

    pub fn social(&self, platform: &str) -> Option<&str> {
        self.social_links
            .iter()
            .find(|s| s.platform == platform)
            .map(|s| s.url.as_str())
    }
}

/// Per-role behaviour: what a block looks like, how its markup is bound to
/// settings, and how one instance becomes a configuration record.
pub(crate) trait BlockStrategy {
    fn extract(&self, node: &NodeRef) -> BlockInstance;

    fn synthesize(&self, pattern: &BlockPattern, first: &BlockInstance) -> SchemaBlockDefinition;

    fn rewrite(&self, node: &NodeRef, definition: &SchemaBlockDefinition);

    fn value_for(&self, id: &str, instance: &BlockInstance) -> Option<String>;

    fn build_record(
        &self,
        definition: &SchemaBlockDefinition,
        instance: &BlockInstance,
    ) -> Map<String, Value> {
        let mut settings = Map::new();
        for setting in &definition.settings {
            let fallback = setting
                .default
                .as_ref()
                .and_then(|d| d.as_str())
                .unwrap_or("")
                .to_string();
            let value = match self.value_for(&setting.id, instance) {
                Some(raw) if setting.kind != SettingType::ImagePicker => {
                    if contains_liquid(&raw) {
                        setting.default.clone()
                    } else {
                        Some(sanitize_default(setting.kind, Some(&raw), &fallback))
                    }
                }
                _ => setting.default.clone(),
            };
            if let Some(value) = value {
                settings.insert(setting.id.clone(), value);
            }
        }
        settings
    }
}

pub(crate) fn strategy_for(role: BlockRole) -> &'static dyn BlockStrategy {
    match role {
        BlockRole::Generic => &GenericBlock,
        BlockRole::Header => &HeaderBlock,
        BlockRole::FooterColumn => &FooterColumnBlock,
        BlockRole::TeamMember => &TeamMemberBlock,
        BlockRole::BeforeAfter => &BeforeAfterBlock,
    }
}

pub(crate) fn block_ref(id: &str) -> String {
    format!("{{{{ block.settings.{id} }}}}")
}

/// `src` expression for an image setting, falling back when the picker is blank.
pub(crate) fn image_src_liquid(scope: &str, id: &str, fallback: &str, width: u32) -> String {
    format!(
        "{{% if {scope}.settings.{id} != blank %}}{{{{ {scope}.settings.{id} | image_url: width: {width} }}}}{{% else %}}{fallback}{{% endif %}}"
    )
}

pub(crate) fn loop_open(kind: &str) -> String {
    format!("{{%- for block in section.blocks -%}}{{%- if block.type == '{kind}' -%}}")
}

pub(crate) const LOOP_CLOSE: &str = "{%- endif -%}{%- endfor -%}";

pub(crate) fn if_present(id: &str) -> String {
    format!("{{%- if block.settings.{id} != blank -%}}")
}

pub(crate) const END_IF: &str = "{%- endif -%}";

/// Points an `<img>` at a block image picker plus its `_src` text fallback.
pub(crate) fn bind_block_image(img: &NodeRef, id: &str, alt_id: Option<&str>) {
    let fallback = block_ref(&format!("{id}_src"));
    dom::set_attr(img, "src", &image_src_liquid("block", id, &fallback, IMAGE_WIDTH));
    if let Some(alt_id) = alt_id {
        dom::set_attr(img, "alt", &format!("{{{{ block.settings.{alt_id} | escape }}}}"));
    }
    for attr in ["srcset", "data-src", "data-srcset", "sizes"] {
        dom::remove_attr(img, attr);
    }
}

pub(crate) fn image_ref(img: &NodeRef) -> Option<ImageRef> {
    let src = dom::attr(img, "src")
        .or_else(|| dom::attr(img, "data-src"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())?;
    let alt = dom::attr(img, "alt").map(|a| normalize_whitespace(&a)).unwrap_or_default();
    Some(ImageRef { src, alt })
}

pub(crate) fn link_ref(anchor: &NodeRef) -> LinkRef {
    LinkRef {
        text: dom::text(anchor),
        url: dom::attr(anchor, "href").unwrap_or_default().trim().to_string(),
    }
}

/// The element to repeat or remove for a link: its `<li>` when it is the only child.
pub(crate) fn link_item(anchor: &NodeRef) -> NodeRef {
    if let Some(parent) = anchor.parent() {
        if dom::is_tag(&parent, &["li"]) && dom::children_elements(&parent).len() == 1 {
            return parent;
        }
    }
    anchor.clone()
}

pub(crate) fn social_platform(anchor: &NodeRef, platforms: &[&'static str]) -> Option<&'static str> {
    let href = dom::attr(anchor, "href").unwrap_or_default().to_lowercase();
    let icons: Vec<String> = dom::select(anchor, "i, svg, span")
        .iter()
        .flat_map(dom::classes)
        .collect();
    let own = dom::classes(anchor);
    platforms.iter().copied().find(|platform| {
        let domain_hit = href.contains(&format!("{platform}.com"))
            || (*platform == "twitter" && (href.contains("//x.com") || href.contains(".x.com")));
        domain_hit || icons.iter().chain(own.iter()).any(|c| c.contains(platform))
    })
}

/// Nodes inside one instance that carry the generic fields.
#[derive(Default)]
pub(crate) struct Located {
    pub heading: Option<NodeRef>,
    pub subheading: Option<NodeRef>,
    pub author: Option<NodeRef>,
    pub price: Option<NodeRef>,
    pub rating: Option<NodeRef>,
    pub icon: Option<NodeRef>,
    pub button: Option<NodeRef>,
    pub image: Option<NodeRef>,
    pub description: Vec<NodeRef>,
}

impl Located {
    fn taken(&self) -> Vec<NodeRef> {
        [
            &self.heading,
            &self.subheading,
            &self.author,
            &self.price,
            &self.rating,
            &self.icon,
            &self.button,
            &self.image,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}

fn free(node: &NodeRef, taken: &[NodeRef]) -> bool {
    !taken.iter().any(|t| dom::overlaps(node, t))
}

fn first_free(root: &NodeRef, selector: &str, taken: &[NodeRef]) -> Option<NodeRef> {
    dom::select(root, selector)
        .into_iter()
        .find(|n| free(n, taken) && !dom::text(n).is_empty())
}

fn price_leaf(root: &NodeRef, taken: &[NodeRef]) -> Option<NodeRef> {
    dom::select(root, "span, strong, b, p, div")
        .into_iter()
        .filter(|n| dom::children_elements(n).is_empty() && free(n, taken))
        .find(|n| {
            let t = dom::text(n);
            t.chars().count() <= 24 && PRICE_RE.is_match(&t)
        })
}

pub(crate) fn locate(root: &NodeRef) -> Located {
    let mut found = Located::default();

    found.heading = first_free(root, HEADINGS, &[]).or_else(|| first_free(root, TITLE_FALLBACK, &[]));
    let taken = found.taken();
    found.subheading = first_free(root, SUBHEADING, &taken).or_else(|| first_free(root, HEADINGS, &taken));
    let taken = found.taken();
    found.author = first_free(root, AUTHOR, &taken);
    let taken = found.taken();
    found.price = first_free(root, PRICE, &taken).or_else(|| price_leaf(root, &taken));
    let taken = found.taken();
    found.rating = dom::select(root, RATING).into_iter().find(|n| free(n, &taken));
    let taken = found.taken();
    found.icon = dom::select(root, ICON).into_iter().find(|n| free(n, &taken));
    let taken = found.taken();
    found.button = first_free(root, BUTTON, &taken).or_else(|| {
        dom::select(root, "a")
            .into_iter()
            .rev()
            .find(|a| free(a, &taken) && !dom::text(a).is_empty())
    });
    let taken = found.taken();
    found.image = dom::select(root, "img")
        .into_iter()
        .find(|n| free(n, &taken) && image_ref(n).is_some());
    let taken = found.taken();
    found.description = dom::select(root, "p")
        .into_iter()
        .filter(|p| free(p, &taken) && !dom::text(p).is_empty())
        .collect();
    found
}

pub(crate) fn rating_value(node: &NodeRef) -> Option<f64> {
    if let Some(v) = dom::attr(node, "data-rating").and_then(|v| v.trim().parse::<f64>().ok()) {
        return Some(v);
    }
    let text = dom::text(node);
    let stars = text.chars().filter(|c| *c == '★').count();
    if stars > 0 {
        return Some(stars as f64);
    }
    let icons = dom::select(node, "i[class*=fa-star]")
        .iter()
        .filter(|i| {
            let classes = dom::classes(i);
            !classes.iter().any(|c| c == "far" || c == "fa-star-o")
        })
        .count();
    if icons > 0 {
        return Some(icons as f64);
    }
    text.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .find_map(|t| t.parse::<f64>().ok())
}

pub(crate) fn paragraph_texts(nodes: &[NodeRef]) -> Option<String> {
    let texts: Vec<String> = nodes.iter().map(dom::text).filter(|t| !t.is_empty()).collect();
    if texts.is_empty() {
        None
    } else {
        Some(richtext(&texts))
    }
}

/// Reads the generic fields through `locate`.
pub(crate) fn extract_generic(node: &NodeRef) -> BlockInstance {
    let found = locate(node);
    let text_of = |n: &Option<NodeRef>| n.as_ref().map(dom::text).filter(|t| !t.is_empty());
    BlockInstance {
        heading: text_of(&found.heading),
        subheading: text_of(&found.subheading),
        author: text_of(&found.author),
        description: paragraph_texts(&found.description),
        image: found.image.as_ref().and_then(image_ref),
        images: dom::select(node, "img").iter().filter_map(image_ref).collect(),
        icon: found
            .icon
            .as_ref()
            .and_then(|i| dom::attr(i, "class"))
            .map(|c| normalize_whitespace(&c)),
        button: found.button.as_ref().map(link_ref).filter(|l| !l.text.is_empty()),
        price: text_of(&found.price),
        rating: found.rating.as_ref().and_then(rating_value),
        background_image: dom::attr(node, "style").and_then(|s| dom::background_url(&s)),
        ..BlockInstance::default()
    }
}

/// Replaces the first description paragraph with a richtext reference and drops the rest.
pub(crate) fn bind_description(paragraphs: &[NodeRef], id: &str) {
    let Some((first, rest)) = paragraphs.split_first() else {
        return;
    };
    if let Some(div) = dom::retag(first, "div") {
        div.append(NodeRef::new_text(block_ref(id)));
    }
    for p in rest {
        p.detach();
    }
}

pub(crate) fn default_text(value: Option<&str>, fallback: &str) -> String {
    match sanitize_default(SettingType::Text, value, fallback) {
        Value::String(s) => s,
        _ => fallback.to_string(),
    }
}

/// Richtext default that never carries template syntax.
pub(crate) fn default_richtext(value: Option<&str>, fallback: &str) -> String {
    match sanitize_default(SettingType::Richtext, value, fallback) {
        Value::String(s) => s,
        _ => richtext(&[fallback]),
    }
}

pub(crate) fn default_url(value: Option<&str>) -> String {
    match sanitize_default(SettingType::Url, value, "") {
        Value::String(s) => s,
        _ => "/".to_string(),
    }
}
