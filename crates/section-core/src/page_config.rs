use serde_json::{json, Map, Value};

use crate::schema::setting_defaults;
use crate::types::{ConfigurationBlockRecord, MainSection, PageConfiguration, PageSections, SchemaSetting};

pub const MAIN_SECTION: &str = "main";

/// Page configuration whose main section mirrors the schema defaults and
/// carries one block entry per record, in record order.
pub fn build_page_configuration(
    slug: &str,
    settings: &[SchemaSetting],
    records: &[ConfigurationBlockRecord],
) -> PageConfiguration {
    let values = setting_defaults(settings);
    let mut blocks = Map::new();
    let mut block_order = Vec::with_capacity(records.len());
    for record in records {
        blocks.insert(
            record.id.clone(),
            json!({ "type": record.kind, "settings": Value::Object(record.settings.clone()) }),
        );
        block_order.push(record.id.clone());
    }
    PageConfiguration {
        sections: PageSections {
            main: MainSection {
                kind: slug.to_string(),
                settings: values,
                blocks,
                block_order,
            },
        },
        order: vec![MAIN_SECTION.to_string()],
    }
}
