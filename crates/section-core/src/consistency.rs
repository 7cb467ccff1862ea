use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{info, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::assemble::{replace_schema_segment, schema_segment};
use crate::text::{normalize_slug, schema_title};
use crate::types::{ConsistencyReport, Mismatch, MismatchKind};

const MAX_SCHEMA_NAME: usize = 25;

#[derive(Clone, Debug, PartialEq)]
pub struct EnforcedArtifacts {
    pub liquid: String,
    pub json_template: String,
    pub report: ConsistencyReport,
    pub changes: Vec<String>,
}

struct Enforcer {
    slug: String,
    report: ConsistencyReport,
    changes: Vec<String>,
}

impl Enforcer {
    fn mismatch(&mut self, kind: MismatchKind, actual: &str, expected: &str, location: &str) {
        warn!(?kind, actual, expected, location, "artifact mismatch corrected");
        self.report.mismatches.push(Mismatch {
            kind,
            expected: expected.to_string(),
            actual: actual.to_string(),
            location: location.to_string(),
        });
        self.changes
            .push(format!("Corrected {location} from '{actual}' to '{expected}'"));
    }

    fn warning(&mut self, message: String) {
        warn!("{message}");
        self.report.warnings.push(message);
    }

    /// Returns the schema's block types, or `None` when the schema is unusable.
    fn schema(&mut self, schema: &mut Value) -> Option<BTreeSet<String>> {
        let Some(object) = schema.as_object_mut() else {
            self.warning("Schema is not a JSON object".to_string());
            return None;
        };
        let class = object.get("class").and_then(Value::as_str).unwrap_or("").to_string();
        if class != self.slug {
            let slug = self.slug.clone();
            self.mismatch(MismatchKind::SchemaType, &class, &slug, "schema.class");
            object.insert("class".to_string(), Value::String(slug.clone()));
            self.report.corrections.schema_type = Some(slug);
        }
        let name = object.get("name").and_then(Value::as_str).unwrap_or("").to_string();
        if name.trim().is_empty() || name.graphemes(true).count() > MAX_SCHEMA_NAME {
            let expected = schema_title(&self.slug);
            self.mismatch(MismatchKind::SchemaName, &name, &expected, "schema.name");
            object.insert("name".to_string(), Value::String(expected.clone()));
            self.report.corrections.schema_name = Some(expected);
        }
        let types = object
            .get("blocks")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|b| b.get("type").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Some(types)
    }

    fn template(&mut self, template: &mut Value, known: Option<&BTreeSet<String>>) {
        let Some(main) = template
            .get_mut("sections")
            .and_then(|s| s.get_mut("main"))
            .and_then(Value::as_object_mut)
        else {
            self.warning("Page configuration has no sections.main".to_string());
            return;
        };
        let kind = main.get("type").and_then(Value::as_str).unwrap_or("").to_string();
        if kind != self.slug {
            let slug = self.slug.clone();
            self.mismatch(MismatchKind::JsonType, &kind, &slug, "sections.main.type");
            main.insert("type".to_string(), Value::String(slug.clone()));
            self.report.corrections.json_type = Some(slug);
        }
        let Some(known) = known else {
            return;
        };
        let mut dropped = Vec::new();
        if let Some(blocks) = main.get_mut("blocks").and_then(Value::as_object_mut) {
            blocks.retain(|id, block| {
                let keep = block
                    .get("type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| known.contains(t));
                if !keep {
                    dropped.push(id.clone());
                }
                keep
            });
        }
        if dropped.is_empty() {
            return;
        }
        if let Some(order) = main.get_mut("block_order").and_then(Value::as_array_mut) {
            order.retain(|id| id.as_str().is_some_and(|id| !dropped.iter().any(|d| d == id)));
        }
        for id in dropped {
            self.warning(format!("Removed block '{id}' with a type the schema does not define"));
            self.changes.push(format!("Removed block '{id}' with unknown type"));
        }
    }
}

/// Makes the schema type, the page configuration type and the file name
/// agree, rewriting the artifacts so the slug of `file_name` wins.
pub fn enforce_consistency(file_name: &str, liquid: &str, json_template: &str) -> EnforcedArtifacts {
    let mut enforcer = Enforcer {
        slug: normalize_slug(file_name),
        report: ConsistencyReport::default(),
        changes: Vec::new(),
    };
    enforcer.report.corrections.file_name_slug = enforcer.slug.clone();

    let mut liquid_out = liquid.to_string();
    let mut known = None;
    match schema_segment(liquid).map(serde_json::from_str::<Value>) {
        None => enforcer.warning("Template has no schema segment".to_string()),
        Some(Err(err)) => enforcer.warning(format!("Schema segment is not valid JSON: {err}")),
        Some(Ok(mut schema)) => {
            let before = enforcer.report.mismatches.len();
            known = enforcer.schema(&mut schema);
            if enforcer.report.mismatches.len() > before {
                match serde_json::to_string_pretty(&schema) {
                    Ok(text) => {
                        if let Some(updated) = replace_schema_segment(liquid, &text) {
                            liquid_out = updated;
                        }
                    }
                    Err(err) => enforcer.warning(format!("Schema could not be rewritten: {err}")),
                }
            }
        }
    }

    let mut json_out = json_template.to_string();
    match serde_json::from_str::<Value>(json_template) {
        Err(err) => enforcer.warning(format!("Page configuration is not valid JSON: {err}")),
        Ok(mut template) => {
            let before = (enforcer.report.mismatches.len(), enforcer.changes.len());
            enforcer.template(&mut template, known.as_ref());
            if (enforcer.report.mismatches.len(), enforcer.changes.len()) != before {
                match serde_json::to_string_pretty(&template) {
                    Ok(text) => json_out = text,
                    Err(err) => enforcer.warning(format!("Page configuration could not be rewritten: {err}")),
                }
            }
        }
    }

    if !enforcer.changes.is_empty() {
        info!(slug = %enforcer.slug, changes = enforcer.changes.len(), "artifacts corrected");
    }
    EnforcedArtifacts {
        liquid: liquid_out,
        json_template: json_out,
        report: enforcer.report,
        changes: enforcer.changes,
    }
}
