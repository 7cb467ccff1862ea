use kuchiki::NodeRef;
use serde_json::Value;

use super::{
    bind_block_image, bind_description, block_ref, default_richtext, default_text, default_url, extract_generic, link_ref, locate,
    social_platform, BlockInstance, BlockStrategy, SocialLink, END_IF,
};
use crate::catalog::BlockPattern;
use crate::dom;
use crate::text::title_case;
use crate::types::{SchemaBlockDefinition, SchemaSetting, SettingType};

const TEAM_PLATFORMS: &[&str] = &["linkedin", "twitter", "instagram", "facebook"];

pub(crate) struct TeamMemberBlock;

fn social_anchors(node: &NodeRef) -> Vec<(NodeRef, &'static str)> {
    dom::select(node, "a")
        .into_iter()
        .filter_map(|a| social_platform(&a, TEAM_PLATFORMS).map(|p| (a, p)))
        .collect()
}

impl BlockStrategy for TeamMemberBlock {
    fn extract(&self, node: &NodeRef) -> BlockInstance {
        let generic = extract_generic(node);
        BlockInstance {
            heading: generic.heading,
            subheading: generic.subheading,
            description: generic.description,
            image: generic.image,
            social_links: social_anchors(node)
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
        let mut settings = vec![
            SchemaSetting::text("name", "Name", &default_text(first.heading.as_deref(), "Team member")),
            SchemaSetting::text("position", "Position", &default_text(first.subheading.as_deref(), "Role")),
        ];
        if let Some(bio) = &first.description {
            settings.push(SchemaSetting::richtext("bio", "Bio", &default_richtext(Some(bio), "Add a short bio.")));
        }
        if let Some(image) = &first.image {
            settings.push(SchemaSetting::image("image", "Photo"));
            settings.push(SchemaSetting::text("image_src", "Photo fallback URL", &default_text(Some(&image.src), "")));
            settings.push(SchemaSetting::text("image_alt", "Photo alt text", &default_text(Some(&image.alt), "")));
        }
        for platform in TEAM_PLATFORMS {
            let mut setting = SchemaSetting::new(
                SettingType::Url,
                format!("{platform}_url"),
                &format!("{} URL", title_case(platform)),
            );
            if let Some(url) = first.social(platform) {
                setting = setting.with_default(Value::String(default_url(Some(url))));
            }
            settings.push(setting);
        }
        SchemaBlockDefinition {
            kind: pattern.kind.clone(),
            name: pattern.name.clone(),
            limit: pattern.max_instances,
            settings,
        }
    }

    fn rewrite(&self, node: &NodeRef, definition: &SchemaBlockDefinition) {
        let found = locate(node);
        let social = social_anchors(node);
        if let Some(heading) = &found.heading {
            dom::set_text(heading, &block_ref("name"));
        }
        if let Some(position) = &found.subheading {
            dom::set_text(position, &block_ref("position"));
        }
        if let (Some(img), true) = (&found.image, definition.has("image")) {
            bind_block_image(img, "image", Some("image_alt"));
        }
        if definition.has("bio") {
            let paragraphs: Vec<NodeRef> = found
                .description
                .into_iter()
                .filter(|p| !social.iter().any(|(a, _)| dom::overlaps(p, a)))
                .collect();
            bind_description(&paragraphs, "bio");
        }
        for (anchor, platform) in &social {
            let id = format!("{platform}_url");
            dom::set_attr(anchor, "href", &block_ref(&id));
            dom::wrap_with(anchor, &format!("{{%- if block.settings.{id} != blank -%}}"), END_IF);
        }
    }

    fn value_for(&self, id: &str, instance: &BlockInstance) -> Option<String> {
        match id {
            "name" => instance.heading.clone(),
            "position" => instance.subheading.clone(),
            "bio" => instance.description.clone(),
            "image_src" => instance.image.as_ref().map(|i| i.src.clone()),
            "image_alt" => instance.image.as_ref().map(|i| i.alt.clone()),
            _ => {
                let platform = id.strip_suffix("_url")?;
                instance.social(platform).map(str::to_string)
            }
        }
    }
}
