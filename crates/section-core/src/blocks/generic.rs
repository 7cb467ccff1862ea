use kuchiki::NodeRef;

use super::{
    bind_block_image, bind_description, block_ref, default_richtext, default_text, default_url, extract_generic,
    image_src_liquid, locate, BlockInstance, BlockStrategy,
};
use crate::catalog::BlockPattern;
use crate::dom;
use crate::text::{clamp_rating, snippet};
use crate::types::{SchemaBlockDefinition, SchemaSetting};

const RATING_STARS: &str =
    "{%- assign rating_stars = block.settings.rating | round -%}{%- for i in (1..rating_stars) -%}★{%- endfor -%}";

pub(crate) struct GenericBlock;

/// Settings for the fields present on `first`, in a fixed order.
pub(crate) fn generic_settings(first: &BlockInstance) -> Vec<SchemaSetting> {
    let mut settings = Vec::new();
    if let Some(heading) = &first.heading {
        settings.push(SchemaSetting::text(
            "heading",
            &format!("Heading ({})", snippet(heading, 4)),
            &default_text(Some(heading), "Heading"),
        ));
    }
    if let Some(sub) = &first.subheading {
        settings.push(SchemaSetting::text("subheading", "Subheading", &default_text(Some(sub), "Subheading")));
    }
    if let Some(author) = &first.author {
        settings.push(SchemaSetting::text("author", "Author", &default_text(Some(author), "Author")));
    }
    if let Some(price) = &first.price {
        settings.push(SchemaSetting::text("price", "Price", &default_text(Some(price), "")));
    }
    if let Some(rating) = first.rating {
        settings.push(SchemaSetting::rating("rating", "Rating", clamp_rating(rating)));
    }
    if let Some(description) = &first.description {
        settings.push(SchemaSetting::richtext(
            "description",
            "Description",
            &default_richtext(Some(description), "Add a short description."),
        ));
    }
    if let Some(image) = &first.image {
        settings.push(SchemaSetting::image("image", "Image"));
        settings.push(SchemaSetting::text("image_src", "Image fallback URL", &default_text(Some(&image.src), "")));
        settings.push(SchemaSetting::text("image_alt", "Image alt text", &default_text(Some(&image.alt), "")));
    }
    if let Some(icon) = &first.icon {
        settings.push(
            SchemaSetting::text("icon", "Icon class", &default_text(Some(icon), ""))
                .with_info("CSS classes of the icon element"),
        );
    }
    if let Some(button) = &first.button {
        settings.push(SchemaSetting::text(
            "button_text",
            "Button label",
            &default_text(Some(&button.text), "Learn more"),
        ));
        settings.push(SchemaSetting::url("button_url", "Button link", &default_url(Some(&button.url))));
    }
    if let Some(bg) = &first.background_image {
        settings.push(SchemaSetting::image("background_image", "Background image"));
        settings.push(SchemaSetting::text(
            "background_image_src",
            "Background fallback URL",
            &default_text(Some(bg), ""),
        ));
    }
    settings
}

pub(crate) fn generic_value(id: &str, instance: &BlockInstance) -> Option<String> {
    match id {
        "heading" => instance.heading.clone(),
        "subheading" => instance.subheading.clone(),
        "author" => instance.author.clone(),
        "price" => instance.price.clone(),
        "rating" => instance.rating.map(|r| r.to_string()),
        "description" => instance.description.clone(),
        "image_src" => instance.image.as_ref().map(|i| i.src.clone()),
        "image_alt" => instance.image.as_ref().map(|i| i.alt.clone()),
        "icon" => instance.icon.clone(),
        "button_text" => instance.button.as_ref().map(|b| b.text.clone()),
        "button_url" => instance.button.as_ref().map(|b| b.url.clone()),
        "background_image_src" => instance.background_image.clone(),
        _ => None,
    }
}

/// Binds every located field that the definition declares.
pub(crate) fn rewrite_generic(node: &NodeRef, definition: &SchemaBlockDefinition) {
    let found = locate(node);
    let bind_text = |slot: &Option<NodeRef>, id: &str| {
        if let (Some(n), true) = (slot, definition.has(id)) {
            dom::set_text(n, &block_ref(id));
        }
    };
    bind_text(&found.heading, "heading");
    bind_text(&found.subheading, "subheading");
    bind_text(&found.author, "author");
    bind_text(&found.price, "price");

    if let (Some(rating), true) = (&found.rating, definition.has("rating")) {
        if dom::attr(rating, "data-rating").is_some() {
            dom::set_attr(rating, "data-rating", &block_ref("rating"));
        }
        dom::set_text(rating, RATING_STARS);
    }
    if let (Some(icon), true) = (&found.icon, definition.has("icon")) {
        dom::set_attr(icon, "class", &block_ref("icon"));
    }
    if let (Some(button), true) = (&found.button, definition.has("button_text")) {
        dom::set_text(button, &block_ref("button_text"));
        if dom::is_tag(button, &["a"]) {
            dom::set_attr(button, "href", &block_ref("button_url"));
        }
    }
    if let (Some(img), true) = (&found.image, definition.has("image")) {
        bind_block_image(img, "image", Some("image_alt"));
    }
    if definition.has("description") {
        bind_description(&found.description, "description");
    }
    if definition.has("background_image") {
        if let Some(style) = dom::attr(node, "style") {
            let fallback = block_ref("background_image_src");
            let liquid = image_src_liquid("block", "background_image", &fallback, 1920);
            dom::set_attr(node, "style", &dom::replace_background_url(&style, &liquid));
        }
    }
}

impl BlockStrategy for GenericBlock {
    fn extract(&self, node: &NodeRef) -> BlockInstance {
        extract_generic(node)
    }

    fn synthesize(&self, pattern: &BlockPattern, first: &BlockInstance) -> SchemaBlockDefinition {
        SchemaBlockDefinition {
            kind: pattern.kind.clone(),
            name: pattern.name.clone(),
            limit: pattern.max_instances,
            settings: generic_settings(first),
        }
    }

    fn rewrite(&self, node: &NodeRef, definition: &SchemaBlockDefinition) {
        rewrite_generic(node, definition);
    }

    fn value_for(&self, id: &str, instance: &BlockInstance) -> Option<String> {
        generic_value(id, instance)
    }
}
