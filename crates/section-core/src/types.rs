use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::text::truncate_label;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    Text,
    Textarea,
    Richtext,
    Url,
    Number,
    Range,
    Checkbox,
    Color,
    ImagePicker,
    Collection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaSetting {
    #[serde(rename = "type")]
    pub kind: SettingType,
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl SchemaSetting {
    pub fn new(kind: SettingType, id: impl Into<String>, label: &str) -> Self {
        Self {
            kind,
            id: id.into(),
            label: truncate_label(label),
            default: None,
            min: None,
            max: None,
            step: None,
            info: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn text(id: impl Into<String>, label: &str, default: &str) -> Self {
        Self::new(SettingType::Text, id, label).with_default(Value::String(default.to_string()))
    }

    pub fn richtext(id: impl Into<String>, label: &str, default: &str) -> Self {
        Self::new(SettingType::Richtext, id, label).with_default(Value::String(default.to_string()))
    }

    pub fn url(id: impl Into<String>, label: &str, default: &str) -> Self {
        Self::new(SettingType::Url, id, label).with_default(Value::String(default.to_string()))
    }

    pub fn image(id: impl Into<String>, label: &str) -> Self {
        Self::new(SettingType::ImagePicker, id, label)
    }

    pub fn color(id: impl Into<String>, label: &str) -> Self {
        Self::new(SettingType::Color, id, label)
    }

    pub fn checkbox(id: impl Into<String>, label: &str, default: bool) -> Self {
        Self::new(SettingType::Checkbox, id, label).with_default(Value::Bool(default))
    }

    pub fn range(id: impl Into<String>, label: &str, min: Value, max: Value, step: Value, default: Value) -> Self {
        let mut setting = Self::new(SettingType::Range, id, label).with_default(default);
        setting.min = Some(min);
        setting.max = Some(max);
        setting.step = Some(step);
        setting
    }

    /// 1 to 5 in 0.1 steps.
    pub fn rating(id: impl Into<String>, label: &str, default: f64) -> Self {
        Self::range(id, label, json!(1), json!(5), json!(0.1), json!(default))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaBlockDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub limit: usize,
    pub settings: Vec<SchemaSetting>,
}

impl SchemaBlockDefinition {
    pub fn setting(&self, id: &str) -> Option<&SchemaSetting> {
        self.settings.iter().find(|s| s.id == id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.setting(id).is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresetBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<PresetBlock>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnabledOn {
    pub templates: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub tag: String,
    /// Declared section type; always the filename slug.
    pub class: String,
    pub settings: Vec<SchemaSetting>,
    pub blocks: Vec<SchemaBlockDefinition>,
    pub presets: Vec<Preset>,
    pub enabled_on: EnabledOn,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigurationBlockRecord {
    #[serde(skip_serializing)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub settings: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MainSection {
    #[serde(rename = "type")]
    pub kind: String,
    pub settings: Map<String, Value>,
    pub blocks: Map<String, Value>,
    pub block_order: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageSections {
    pub main: MainSection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageConfiguration {
    pub sections: PageSections,
    pub order: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Page,
    Collection,
    Product,
    Blog,
}

impl PageType {
    pub fn template_name(self) -> &'static str {
        match self {
            PageType::Page => "page",
            PageType::Collection => "collection",
            PageType::Product => "product",
            PageType::Blog => "blog",
        }
    }

    /// Collection that drives a dynamic product loop on this kind of template.
    pub fn product_source(self) -> &'static str {
        match self {
            PageType::Collection => "collection.products",
            _ => "collections[section.settings.featured_collection].products",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    SchemaType,
    SchemaName,
    JsonType,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub expected: String,
    pub actual: String,
    pub location: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Corrections {
    pub file_name_slug: String,
    pub schema_name: Option<String>,
    pub schema_type: Option<String>,
    pub json_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConsistencyReport {
    pub mismatches: Vec<Mismatch>,
    pub warnings: Vec<String>,
    pub corrections: Corrections,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutput {
    pub liquid_content: String,
    pub json_template: String,
    pub head_content: String,
    pub schema: Schema,
    pub css: String,
    pub javascript: String,
    pub section_file_name: String,
    pub template_file_name: String,
    pub page_type: PageType,
    pub report: ConsistencyReport,
    pub changes: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutput {
    pub documents: Vec<ConversionOutput>,
    pub head_content: String,
}
