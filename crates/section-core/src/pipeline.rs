use head_merge::merge_head_lines;
use tracing::{debug, info, warn};

use crate::assemble::{assemble_template, schema_segment, TemplateParts};
use crate::config::ConvertOptions;
use crate::consistency::enforce_consistency;
use crate::detect::detect_blocks;
use crate::dom;
use crate::error::ConvertError;
use crate::extract::extract_assets;
use crate::featured::replace_featured_products;
use crate::page_config::build_page_configuration;
use crate::page_type::classify_page_type;
use crate::quotes::repair_schema_quotes;
use crate::rewrite::{apply_blocks, inject_blocks};
use crate::schema::build_schema;
use crate::settings::extract_section_settings;
use crate::text::normalize_slug;
use crate::types::{BatchOutput, ConversionOutput, Schema};

fn validate(html: &str, name: &str) -> Result<(), ConvertError> {
    if html.trim().is_empty() {
        return Err(ConvertError::InvalidInput("HTML input is empty".to_string()));
    }
    if name.trim().is_empty() {
        return Err(ConvertError::InvalidInput("target name is empty".to_string()));
    }
    Ok(())
}

/// Converts one HTML document into a section template and its page configuration.
pub fn convert(html: &str, name: &str, options: &ConvertOptions) -> Result<ConversionOutput, ConvertError> {
    validate(html, name)?;
    let slug = normalize_slug(name);
    let document = dom::parse_document(html);
    let assets = extract_assets(&document);
    let body = dom::body(&document);
    let page_type = classify_page_type(name, &body);
    debug!(%slug, ?page_type, "converting");

    let mut changes = Vec::new();
    let mut warnings = Vec::new();
    let mut excluded = Vec::new();
    let mut seed = Vec::new();

    if options.featured_products {
        let featured = replace_featured_products(&body, page_type, options);
        excluded.extend(featured.region);
        seed.extend(featured.settings);
        changes.extend(featured.changes);
    }

    let detection = detect_blocks(&body, options, &excluded);
    warnings.extend(detection.warnings);
    let mut blocks = apply_blocks(&detection.blocks, &slug);
    inject_blocks(&mut blocks, &options.inject_blocks, &body);
    changes.append(&mut blocks.changes);
    warnings.append(&mut blocks.warnings);

    let mut regions = blocks.regions.clone();
    regions.extend(excluded);
    let settings = extract_section_settings(&body, &regions, options, seed);
    changes.extend(settings.changes);
    warnings.extend(settings.warnings);

    let schema = build_schema(&slug, page_type, settings.settings, blocks.definitions, &blocks.records);
    let config = build_page_configuration(&slug, &schema.settings, &blocks.records);
    let body_html = dom::inner_html(&body);
    let liquid = assemble_template(&TemplateParts {
        slug: &slug,
        source_name: name.trim(),
        body: &body_html,
        schema: &schema,
        css: &assets.css(),
        scripts: &assets.scripts,
        external_scripts: &assets.external_scripts,
    })?;
    let json_template = serde_json::to_string_pretty(&config)?;

    let enforced = enforce_consistency(name, &liquid, &json_template);
    changes.extend(enforced.changes);
    let repair = repair_schema_quotes(&enforced.liquid);
    if repair.repaired > 0 {
        changes.push(format!("Escaped quotes in {} schema default(s)", repair.repaired));
    }
    if !repair.valid {
        warn!(%slug, "schema segment does not parse");
        warnings.push("Schema segment is not valid JSON".to_string());
    }
    let schema = schema_segment(&repair.liquid)
        .and_then(|segment| serde_json::from_str::<Schema>(segment).ok())
        .unwrap_or(schema);

    info!(%slug, blocks = blocks.records.len(), settings = schema.settings.len(), "section converted");
    Ok(ConversionOutput {
        liquid_content: repair.liquid,
        json_template: enforced.json_template,
        head_content: assets.head_lines.join("\n"),
        schema,
        css: assets.css(),
        javascript: assets.scripts.join("\n\n"),
        section_file_name: format!("sections/{slug}.liquid"),
        template_file_name: format!("templates/{}.{slug}.json", page_type.template_name()),
        page_type,
        report: enforced.report,
        changes,
        warnings,
    })
}

/// Converts each `(html, name)` pair independently, then merges every
/// document's head resources into one deduplicated block.
pub fn convert_batch<H, N>(documents: &[(H, N)], options: &ConvertOptions) -> Result<BatchOutput, ConvertError>
where
    H: AsRef<str>,
    N: AsRef<str>,
{
    let documents = documents
        .iter()
        .map(|(html, name)| convert(html.as_ref(), name.as_ref(), options))
        .collect::<Result<Vec<_>, _>>()?;
    let head_content = merge_head_lines(documents.iter().map(|d| d.head_content.as_str()));
    Ok(BatchOutput {
        documents,
        head_content,
    })
}
