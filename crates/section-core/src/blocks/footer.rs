use kuchiki::NodeRef;
use serde_json::Value;

use super::{
    bind_description, block_ref, default_richtext, default_text, default_url, link_item, link_ref, paragraph_texts, social_platform,
    BlockInstance, BlockStrategy, LinkRef, SocialLink, LOOP_CLOSE,
};
use crate::catalog::BlockPattern;
use crate::dom;
use crate::text::title_case;
use crate::types::{SchemaBlockDefinition, SchemaSetting, SettingType};

pub(crate) const LINK_SLOTS: usize = 6;
pub(crate) const SOCIAL_PLATFORMS: &[&str] = &["facebook", "instagram", "twitter", "linkedin", "youtube"];
const HEADING: &str = "h1, h2, h3, h4, h5, h6, .footer-title, .footer-heading";

const LINK_LOOP: &str = "{%- for i in (1..6) -%}{%- assign link_text_key = 'link_' | append: i | append: '_text' -%}{%- assign link_url_key = 'link_' | append: i | append: '_url' -%}{%- if block.settings[link_text_key] != blank -%}";
const SOCIAL_LOOP: &str = "{%- assign social_platforms = 'facebook,instagram,twitter,linkedin,youtube' | split: ',' -%}{%- for platform in social_platforms -%}{%- assign social_key = 'social_' | append: platform -%}{%- if block.settings[social_key] != blank -%}";

pub(crate) struct FooterColumnBlock;

struct FooterParts {
    heading: Option<NodeRef>,
    paragraphs: Vec<NodeRef>,
    links: Vec<NodeRef>,
    social: Vec<(NodeRef, &'static str)>,
}

fn parts(node: &NodeRef) -> FooterParts {
    let heading = dom::select_first(node, HEADING).filter(|h| !dom::text(h).is_empty());
    let mut links = Vec::new();
    let mut social = Vec::new();
    for anchor in dom::select(node, "a") {
        match social_platform(&anchor, SOCIAL_PLATFORMS) {
            Some(platform) => social.push((anchor, platform)),
            None if !dom::text(&anchor).is_empty() => links.push(anchor),
            None => {}
        }
    }
    let paragraphs = dom::select(node, "p")
        .into_iter()
        .filter(|p| {
            dom::select_first(p, "a").is_none()
                && !dom::text(p).is_empty()
                && heading.as_ref().map_or(true, |h| !dom::overlaps(p, h))
        })
        .collect();
    FooterParts {
        heading,
        paragraphs,
        links,
        social,
    }
}

fn slot(id: &str) -> Option<(usize, &str)> {
    let rest = id.strip_prefix("link_")?;
    let (n, field) = rest.split_once('_')?;
    Some((n.parse::<usize>().ok()?, field))
}

impl BlockStrategy for FooterColumnBlock {
    fn extract(&self, node: &NodeRef) -> BlockInstance {
        let parts = parts(node);
        BlockInstance {
            heading: parts.heading.as_ref().map(dom::text),
            description: paragraph_texts(&parts.paragraphs),
            links: parts.links.iter().take(LINK_SLOTS).map(link_ref).collect(),
            social_links: parts
                .social
                .iter()
                .map(|(a, platform)| SocialLink {
                    platform: *platform,
                    url: link_ref(a).url,
                })
                .collect(),
            ..BlockInstance::default()
        }
    }

    fn synthesize(&self, pattern: &BlockPattern, first: &BlockInstance) -> SchemaBlockDefinition {
        let mut settings = Vec::new();
        if let Some(heading) = &first.heading {
            settings.push(SchemaSetting::text("heading", "Heading", &default_text(Some(heading), "Heading")));
        }
        if let Some(description) = &first.description {
            settings.push(SchemaSetting::richtext(
                "description",
                "Text",
                &default_richtext(Some(description), "Add footer text."),
            ));
        }
        if !first.links.is_empty() {
            for n in 1..=LINK_SLOTS {
                let mut text =
                    SchemaSetting::new(SettingType::Text, format!("link_{n}_text"), &format!("Link {n} label"));
                let mut url = SchemaSetting::new(SettingType::Url, format!("link_{n}_url"), &format!("Link {n} URL"));
                if let Some(LinkRef { text: t, url: u }) = first.links.get(n - 1) {
                    text = text.with_default(Value::String(default_text(Some(t), "")));
                    url = url.with_default(Value::String(default_url(Some(u))));
                }
                settings.push(text);
                settings.push(url);
            }
        }
        if !first.social_links.is_empty() {
            for platform in SOCIAL_PLATFORMS {
                let mut setting = SchemaSetting::new(
                    SettingType::Url,
                    format!("social_{platform}"),
                    &format!("{} URL", title_case(platform)),
                );
                if let Some(url) = first.social(platform) {
                    setting = setting.with_default(Value::String(default_url(Some(url))));
                }
                settings.push(setting);
            }
        }
        SchemaBlockDefinition {
            kind: pattern.kind.clone(),
            name: pattern.name.clone(),
            limit: pattern.max_instances,
            settings,
        }
    }

    fn rewrite(&self, node: &NodeRef, definition: &SchemaBlockDefinition) {
        let parts = parts(node);
        if let (Some(heading), true) = (&parts.heading, definition.has("heading")) {
            dom::set_text(heading, &block_ref("heading"));
        }
        if definition.has("description") {
            bind_description(&parts.paragraphs, "description");
        }
        if let (Some((first, rest)), true) = (parts.links.split_first(), definition.has("link_1_text")) {
            for extra in rest {
                link_item(extra).detach();
            }
            dom::set_text(first, "{{ block.settings[link_text_key] }}");
            dom::set_attr(first, "href", "{{ block.settings[link_url_key] }}");
            dom::wrap_with(&link_item(first), LINK_LOOP, LOOP_CLOSE);
        }
        if let (Some(((first, _), rest)), true) = (parts.social.split_first(), definition.has("social_facebook")) {
            for (extra, _) in rest {
                link_item(extra).detach();
            }
            dom::set_attr(first, "href", "{{ block.settings[social_key] }}");
            dom::set_attr(first, "aria-label", "{{ platform | capitalize }}");
            for icon in dom::select(first, "i") {
                dom::set_attr(&icon, "class", "fab fa-{{ platform }}");
            }
            dom::wrap_with(&link_item(first), SOCIAL_LOOP, LOOP_CLOSE);
        }
    }

    fn value_for(&self, id: &str, instance: &BlockInstance) -> Option<String> {
        match id {
            "heading" => instance.heading.clone(),
            "description" => instance.description.clone(),
            _ => {
                if let Some(platform) = id.strip_prefix("social_") {
                    return instance.social(platform).map(str::to_string);
                }
                let (n, field) = slot(id)?;
                let link = instance.links.get(n.checked_sub(1)?)?;
                match field {
                    "text" => Some(link.text.clone()),
                    "url" => Some(link.url.clone()),
                    _ => None,
                }
            }
        }
    }
}
