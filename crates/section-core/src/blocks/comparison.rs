use kuchiki::NodeRef;

use super::{bind_block_image, block_ref, default_text, image_ref, BlockInstance, BlockStrategy};
use crate::catalog::BlockPattern;
use crate::dom;
use crate::types::{SchemaBlockDefinition, SchemaSetting};

const BEFORE_LABEL: &str = ".before-label, .label-before";
const AFTER_LABEL: &str = ".after-label, .label-after";
const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";

pub(crate) struct BeforeAfterBlock;

fn label(node: &NodeRef, selector: &str) -> Option<String> {
    dom::select_first(node, selector)
        .map(|l| dom::text(&l))
        .filter(|t| !t.is_empty())
}

impl BlockStrategy for BeforeAfterBlock {
    fn extract(&self, node: &NodeRef) -> BlockInstance {
        BlockInstance {
            heading: dom::select_first(node, HEADINGS).map(|h| dom::text(&h)).filter(|t| !t.is_empty()),
            images: dom::select(node, "img").iter().filter_map(image_ref).take(2).collect(),
            labels: (label(node, BEFORE_LABEL), label(node, AFTER_LABEL)),
            ..BlockInstance::default()
        }
    }

    fn synthesize(&self, pattern: &BlockPattern, first: &BlockInstance) -> SchemaBlockDefinition {
        let mut settings = Vec::new();
        if let Some(heading) = &first.heading {
            settings.push(SchemaSetting::text("heading", "Heading", &default_text(Some(heading), "Heading")));
        }
        for (side, image) in ["before", "after"].iter().zip(first.images.iter()) {
            let title = if *side == "before" { "Before" } else { "After" };
            settings.push(SchemaSetting::image(format!("{side}_image"), &format!("{title} image")));
            settings.push(SchemaSetting::text(
                format!("{side}_image_src"),
                &format!("{title} image fallback URL"),
                &default_text(Some(&image.src), ""),
            ));
        }
        if let Some(before) = &first.labels.0 {
            settings.push(SchemaSetting::text("before_label", "Before label", &default_text(Some(before), "Before")));
        }
        if let Some(after) = &first.labels.1 {
            settings.push(SchemaSetting::text("after_label", "After label", &default_text(Some(after), "After")));
        }
        SchemaBlockDefinition {
            kind: pattern.kind.clone(),
            name: pattern.name.clone(),
            limit: pattern.max_instances,
            settings,
        }
    }

    fn rewrite(&self, node: &NodeRef, definition: &SchemaBlockDefinition) {
        let heading = dom::select_first(node, HEADINGS);
        let images: Vec<NodeRef> = dom::select(node, "img")
            .into_iter()
            .filter(|img| image_ref(img).is_some())
            .take(2)
            .collect();
        let before = dom::select_first(node, BEFORE_LABEL);
        let after = dom::select_first(node, AFTER_LABEL);

        if let (Some(h), true) = (&heading, definition.has("heading")) {
            dom::set_text(h, &block_ref("heading"));
        }
        for (side, img) in ["before", "after"].iter().zip(images.iter()) {
            let id = format!("{side}_image");
            if definition.has(&id) {
                bind_block_image(img, &id, None);
            }
        }
        if let (Some(l), true) = (&before, definition.has("before_label")) {
            dom::set_text(l, &block_ref("before_label"));
        }
        if let (Some(l), true) = (&after, definition.has("after_label")) {
            dom::set_text(l, &block_ref("after_label"));
        }
    }

    fn value_for(&self, id: &str, instance: &BlockInstance) -> Option<String> {
        match id {
            "heading" => instance.heading.clone(),
            "before_image_src" => instance.images.first().map(|i| i.src.clone()),
            "after_image_src" => instance.images.get(1).map(|i| i.src.clone()),
            "before_label" => instance.labels.0.clone(),
            "after_label" => instance.labels.1.clone(),
            _ => None,
        }
    }
}
