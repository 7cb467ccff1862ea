use kuchiki::NodeRef;

use super::{
    bind_block_image, block_ref, default_text, default_url, if_present, image_ref, link_item, link_ref, BlockInstance,
    BlockStrategy, END_IF,
};
use crate::catalog::BlockPattern;
use crate::dom;
use crate::types::{SchemaBlockDefinition, SchemaSetting};

const MAX_NAV_LINKS: usize = 8;
const LOGO_IMAGE: &str = ".logo img, .navbar-brand img, .brand img, .site-logo img, img.logo, img[class*=logo], img[src*=logo], img[alt*=logo], img[alt*=Logo]";
const LOGO: &str = ".logo, .navbar-brand, .brand, .site-title, .site-logo";
const MOBILE_MENU: &str = ".mobile-menu, .mobile-nav, .mobile-navigation, .offcanvas-menu";

pub(crate) struct HeaderBlock;

struct HeaderParts {
    logo_image: Option<NodeRef>,
    logo: Option<NodeRef>,
    mobile_menu: Option<NodeRef>,
    nav: Vec<NodeRef>,
    mobile_links: Vec<NodeRef>,
}

fn parts(node: &NodeRef) -> HeaderParts {
    let logo_image = dom::select_first(node, LOGO_IMAGE);
    let logo = dom::select_first(node, LOGO).or_else(|| {
        logo_image
            .as_ref()
            .and_then(|img| img.ancestors().find(|a| dom::is_tag(a, &["a"])))
    });
    let mobile_menu = dom::select_first(node, MOBILE_MENU);
    let mut skip: Vec<NodeRef> = logo.iter().chain(mobile_menu.iter()).cloned().collect();
    skip.extend(logo_image.iter().cloned());
    let nav = dom::select(node, "a")
        .into_iter()
        .filter(|a| !dom::is_within_any(a, &skip) && !dom::text(a).is_empty())
        .collect();
    let mobile_links = mobile_menu
        .as_ref()
        .map(|menu| {
            dom::select(menu, "a")
                .into_iter()
                .filter(|a| !dom::text(a).is_empty())
                .collect()
        })
        .unwrap_or_default();
    HeaderParts {
        logo_image,
        logo,
        mobile_menu,
        nav,
        mobile_links,
    }
}

fn nav_index(id: &str) -> Option<(usize, &str)> {
    let rest = id.strip_prefix("nav_link_")?;
    let (n, field) = rest.split_once('_')?;
    Some((n.parse::<usize>().ok()?, field))
}

fn bind_nav(anchor: &NodeRef, n: usize) {
    let text_id = format!("nav_link_{n}_text");
    dom::set_text(anchor, &block_ref(&text_id));
    dom::set_attr(anchor, "href", &block_ref(&format!("nav_link_{n}_url")));
    dom::wrap_with(&link_item(anchor), &if_present(&text_id), END_IF);
}

impl BlockStrategy for HeaderBlock {
    fn extract(&self, node: &NodeRef) -> BlockInstance {
        let parts = parts(node);
        let logo_text = match (&parts.logo_image, &parts.logo) {
            (None, Some(logo)) => Some(dom::text(logo)).filter(|t| !t.is_empty()),
            _ => None,
        };
        BlockInstance {
            image: parts.logo_image.as_ref().and_then(image_ref),
            logo_text,
            links: parts.nav.iter().take(MAX_NAV_LINKS).map(link_ref).collect(),
            has_mobile_menu: !parts.mobile_links.is_empty(),
            ..BlockInstance::default()
        }
    }

    fn synthesize(&self, pattern: &BlockPattern, first: &BlockInstance) -> SchemaBlockDefinition {
        let mut settings = Vec::new();
        if let Some(logo) = &first.image {
            settings.push(SchemaSetting::image("logo", "Logo"));
            settings.push(SchemaSetting::text("logo_src", "Logo fallback URL", &default_text(Some(&logo.src), "")));
        }
        if let Some(text) = &first.logo_text {
            settings.push(SchemaSetting::text("logo_text", "Logo text", &default_text(Some(text), "Store")));
        }
        for (i, link) in first.links.iter().enumerate() {
            let n = i + 1;
            settings.push(SchemaSetting::text(
                format!("nav_link_{n}_text"),
                &format!("Navigation link {n} label"),
                &default_text(Some(&link.text), ""),
            ));
            settings.push(SchemaSetting::url(
                format!("nav_link_{n}_url"),
                &format!("Navigation link {n} URL"),
                &default_url(Some(&link.url)),
            ));
        }
        if first.has_mobile_menu {
            settings.push(SchemaSetting::checkbox("show_mobile_menu", "Show mobile menu", true));
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
        if let (Some(img), true) = (&parts.logo_image, definition.has("logo")) {
            bind_block_image(img, "logo", None);
        }
        if let (Some(logo), true) = (&parts.logo, definition.has("logo_text")) {
            dom::set_text(logo, &block_ref("logo_text"));
        }
        for (i, anchor) in parts.nav.iter().enumerate() {
            let n = i + 1;
            if definition.has(&format!("nav_link_{n}_text")) {
                bind_nav(anchor, n);
            } else {
                link_item(anchor).detach();
            }
        }
        if let (Some(menu), true) = (&parts.mobile_menu, definition.has("show_mobile_menu")) {
            for (i, anchor) in parts.mobile_links.iter().enumerate() {
                let n = i + 1;
                if definition.has(&format!("nav_link_{n}_text")) {
                    bind_nav(anchor, n);
                } else {
                    link_item(anchor).detach();
                }
            }
            dom::wrap_with(menu, "{%- if block.settings.show_mobile_menu -%}", END_IF);
        }
    }

    fn value_for(&self, id: &str, instance: &BlockInstance) -> Option<String> {
        match id {
            "logo_src" => instance.image.as_ref().map(|i| i.src.clone()),
            "logo_text" => instance.logo_text.clone(),
            "show_mobile_menu" => Some(instance.has_mobile_menu.to_string()),
            _ => {
                let (n, field) = nav_index(id)?;
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
