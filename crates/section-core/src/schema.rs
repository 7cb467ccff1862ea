use serde_json::{Map, Value};

use crate::text::schema_title;
use crate::types::{
    ConfigurationBlockRecord, EnabledOn, PageType, Preset, PresetBlock, Schema, SchemaBlockDefinition, SchemaSetting,
};

pub const SECTION_TAG: &str = "section";
pub const PRESET_NAME: &str = "Default";

/// `id → default` for every setting that declares one.
pub fn setting_defaults(settings: &[SchemaSetting]) -> Map<String, Value> {
    settings
        .iter()
        .filter_map(|s| s.default.clone().map(|d| (s.id.clone(), d)))
        .collect()
}

/// One preset block per record; block types with no record (injected ones)
/// get a single entry carrying their definition defaults.
fn preset_blocks(blocks: &[SchemaBlockDefinition], records: &[ConfigurationBlockRecord]) -> Vec<PresetBlock> {
    let mut preset: Vec<PresetBlock> = records
        .iter()
        .map(|r| PresetBlock {
            kind: r.kind.clone(),
            settings: r.settings.clone(),
        })
        .collect();
    for block in blocks {
        if !records.iter().any(|r| r.kind == block.kind) {
            preset.push(PresetBlock {
                kind: block.kind.clone(),
                settings: setting_defaults(&block.settings),
            });
        }
    }
    preset
}

pub fn build_schema(
    slug: &str,
    page_type: PageType,
    settings: Vec<SchemaSetting>,
    blocks: Vec<SchemaBlockDefinition>,
    records: &[ConfigurationBlockRecord],
) -> Schema {
    let preset = Preset {
        name: PRESET_NAME.to_string(),
        settings: setting_defaults(&settings),
        blocks: preset_blocks(&blocks, records),
    };
    Schema {
        name: schema_title(slug),
        tag: SECTION_TAG.to_string(),
        class: slug.to_string(),
        settings,
        blocks,
        presets: vec![preset],
        enabled_on: EnabledOn {
            templates: vec![page_type.template_name().to_string()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn feature() -> SchemaBlockDefinition {
        SchemaBlockDefinition {
            kind: "feature".to_string(),
            name: "Feature".to_string(),
            limit: 12,
            settings: vec![SchemaSetting::text("heading", "Heading", "Fast")],
        }
    }

    fn record(id: &str, heading: &str) -> ConfigurationBlockRecord {
        let mut settings = Map::new();
        settings.insert("heading".to_string(), json!(heading));
        ConfigurationBlockRecord {
            id: id.to_string(),
            kind: "feature".to_string(),
            settings,
        }
    }

    #[test]
    fn schema_serializes_with_type_keys() {
        let schema = build_schema("about-us", PageType::Page, Vec::new(), vec![feature()], &[]);
        let value = serde_json::to_value(&schema).expect("json");
        assert_eq!(value["name"], json!("About Us"));
        assert_eq!(value["class"], json!("about-us"));
        assert_eq!(value["blocks"][0]["type"], json!("feature"));
        assert_eq!(value["blocks"][0]["settings"][0]["type"], json!("text"));
        assert_eq!(value["enabled_on"]["templates"], json!(["page"]));
    }

    #[test]
    fn default_preset_carries_page_and_instance_defaults() {
        let settings = vec![
            SchemaSetting::color("background_color", "Background"),
            SchemaSetting::text("heading_1", "Heading 1", "Title"),
        ];
        let records = [record("feature_a", "Fast"), record("feature_b", "Cheap")];
        let schema = build_schema("home", PageType::Page, settings, vec![feature()], &records);
        let value = serde_json::to_value(&schema.presets).expect("json");
        assert_eq!(
            value,
            json!([{
                "name": "Default",
                "settings": {"heading_1": "Title"},
                "blocks": [
                    {"type": "feature", "settings": {"heading": "Fast"}},
                    {"type": "feature", "settings": {"heading": "Cheap"}}
                ]
            }])
        );
    }

    #[test]
    fn blocks_without_records_use_definition_defaults() {
        let schema = build_schema("help", PageType::Page, Vec::new(), vec![feature()], &[]);
        assert_eq!(schema.presets[0].blocks.len(), 1);
        assert_eq!(schema.presets[0].blocks[0].settings["heading"], json!("Fast"));
    }
}
