use kuchiki::NodeRef;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::blocks::{block_ref, loop_open, strategy_for, BlockInstance, LOOP_CLOSE};
use crate::catalog::find_pattern;
use crate::detect::DetectedBlock;
use crate::dom;
use crate::text::setting_key;
use crate::types::{ConfigurationBlockRecord, SchemaBlockDefinition, SettingType};

#[derive(Debug, Default)]
pub struct BlockPass {
    pub definitions: Vec<SchemaBlockDefinition>,
    /// One per original instance, grouped by block type in first-seen order.
    pub records: Vec<ConfigurationBlockRecord>,
    /// Retained fragments; later passes leave them alone.
    pub regions: Vec<NodeRef>,
    pub changes: Vec<String>,
    pub warnings: Vec<String>,
}

/// `<type>_<8 hex>` derived from the slug, type and instance index.
pub fn block_id(slug: &str, kind: &str, index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{slug}/{kind}/{index}").as_bytes());
    let hash = hasher.finalize();
    let hex: String = hash[..4].iter().map(|b| format!("{b:02x}")).collect();
    format!("{kind}_{hex}")
}

/// Collapses every detected block to one bound fragment inside a loop and
/// records one configuration block per original instance.
pub fn apply_blocks(detected: &[DetectedBlock], slug: &str) -> BlockPass {
    let mut pass = BlockPass::default();
    for block in detected {
        let (Some(first), Some((keep, rest))) = (block.instances.first(), block.nodes.split_first()) else {
            continue;
        };
        let kind = &block.pattern.kind;
        let strategy = strategy_for(block.pattern.role);
        let definition = strategy.synthesize(&block.pattern, first);

        for (index, instance) in block.instances.iter().enumerate() {
            pass.records.push(ConfigurationBlockRecord {
                id: block_id(slug, kind, index),
                kind: kind.clone(),
                settings: strategy.build_record(&definition, instance),
            });
        }

        strategy.rewrite(keep, &definition);
        for extra in rest {
            extra.detach();
        }
        dom::wrap_with(keep, &loop_open(kind), LOOP_CLOSE);
        debug!(kind = %kind, instances = block.instances.len(), "block collapsed");
        pass.changes.push(format!(
            "Converted {} '{}' element(s) into blocks",
            block.instances.len(),
            kind
        ));
        pass.regions.push(keep.clone());
        pass.definitions.push(definition);
    }
    pass
}

fn injected_markup(definition: &SchemaBlockDefinition) -> String {
    let mut html = format!("<div class='{}'>", definition.kind.replace('_', "-"));
    for setting in &definition.settings {
        let id = setting.id.as_str();
        match setting.kind {
            SettingType::Richtext => html.push_str(&format!("<div>{}</div>", block_ref(id))),
            SettingType::Text if id == "heading" || id == "name" => {
                html.push_str(&format!("<h3>{}</h3>", block_ref(id)))
            }
            SettingType::Text => {
                if let Some(stem) = id.strip_suffix("_text") {
                    let url = format!("{stem}_url");
                    if definition.has(&url) {
                        html.push_str(&format!("<a href='{}'>{}</a>", block_ref(&url), block_ref(id)));
                        continue;
                    }
                }
                if !id.ends_with("_src") && !id.ends_with("_alt") {
                    html.push_str(&format!("<span>{}</span>", block_ref(id)));
                }
            }
            _ => {}
        }
    }
    html.push_str("</div>");
    html
}

/// Adds requested block types that were not detected, each as a minimal
/// fragment appended to `container`. Unknown types are skipped.
pub fn inject_blocks(pass: &mut BlockPass, requested: &[String], container: &NodeRef) {
    for name in requested {
        let kind = setting_key(name);
        if pass.definitions.iter().any(|d| d.kind == kind) {
            debug!(kind = %kind, "requested block already present");
            continue;
        }
        let Some(pattern) = find_pattern(&kind) else {
            warn!(kind = %name, "unknown block type skipped");
            pass.warnings.push(format!("Unknown block type '{name}' skipped"));
            continue;
        };
        let strategy = strategy_for(pattern.role);
        let definition = strategy.synthesize(&pattern, &BlockInstance::sample());
        let holder = dom::parse_document(&injected_markup(&definition));
        let Some(fragment) = dom::select_first(&dom::body(&holder), "div") else {
            continue;
        };
        fragment.detach();
        container.append(fragment.clone());
        dom::wrap_with(&fragment, &loop_open(&kind), LOOP_CLOSE);
        pass.changes.push(format!("Injected block type '{kind}'"));
        pass.regions.push(fragment);
        pass.definitions.push(definition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertOptions;
    use crate::detect::detect_blocks;

    #[test]
    fn ids_are_stable_and_prefixed() {
        let a = block_id("home", "testimonial", 0);
        assert_eq!(a, block_id("home", "testimonial", 0));
        assert_ne!(a, block_id("home", "testimonial", 1));
        assert!(a.starts_with("testimonial_"));
        assert_eq!(a.len(), "testimonial_".len() + 8);
    }

    #[test]
    fn five_instances_collapse_to_one_fragment() {
        let cards: String = (1..=5)
            .map(|i| format!(r#"<div class="testimonial"><p>Quote number {i}</p><cite>Client {i}</cite></div>"#))
            .collect();
        let doc = dom::parse_document(&format!("<section>{cards}</section>"));
        let body = dom::body(&doc);
        let detection = detect_blocks(&body, &ConvertOptions::default(), &[]);
        let pass = apply_blocks(&detection.blocks, "home");

        let html = dom::inner_html(&body);
        assert_eq!(html.matches(r#"class="testimonial""#).count(), 1);
        assert_eq!(html.matches("block.type == 'testimonial'").count(), 1);
        assert_eq!(pass.records.len(), 5);
        let authors: Vec<&str> = pass
            .records
            .iter()
            .filter_map(|r| r.settings["author"].as_str())
            .collect();
        assert_eq!(authors, vec!["Client 1", "Client 2", "Client 3", "Client 4", "Client 5"]);
    }

    #[test]
    fn unknown_injection_is_a_warning() {
        let doc = dom::parse_document("<main></main>");
        let body = dom::body(&doc);
        let mut pass = BlockPass::default();
        inject_blocks(&mut pass, &["testimonial".to_string(), "hologram".to_string()], &body);
        assert_eq!(pass.definitions.len(), 1);
        assert_eq!(pass.warnings.len(), 1);
        let html = dom::inner_html(&body);
        assert!(html.contains("<h3>{{ block.settings.heading }}</h3>"), "{html}");
    }
}
