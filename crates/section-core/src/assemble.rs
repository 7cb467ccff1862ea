use crate::error::ConvertError;
use crate::types::Schema;

pub const SCHEMA_OPEN: &str = "{% schema %}";
pub const SCHEMA_CLOSE: &str = "{% endschema %}";
pub const STYLESHEET_OPEN: &str = "{% stylesheet %}";
pub const STYLESHEET_CLOSE: &str = "{% endstylesheet %}";
pub const JAVASCRIPT_OPEN: &str = "{% javascript %}";
pub const JAVASCRIPT_CLOSE: &str = "{% endjavascript %}";

const PROLOGUE: &str = "{%- liquid
  assign has_custom_bg = false
  if section.settings.background_color != blank
    assign has_custom_bg = true
  endif
  assign has_custom_text = false
  if section.settings.text_color != blank
    assign has_custom_text = true
  endif
-%}";

pub struct TemplateParts<'a> {
    pub slug: &'a str,
    pub source_name: &'a str,
    /// Rewritten body markup.
    pub body: &'a str,
    pub schema: &'a Schema,
    pub css: &'a str,
    pub scripts: &'a [String],
    pub external_scripts: &'a [String],
}

fn header_comment(slug: &str, source_name: &str) -> String {
    format!(
        "{{%- comment -%}}\n  Section: {slug}\n  Source: {source_name}\n  Text, links and images are editable in the theme editor.\n{{%- endcomment -%}}"
    )
}

fn wrapper(slug: &str, body: &str) -> String {
    let style = "{% if has_custom_bg or has_custom_text %} style=\"{% if has_custom_bg %}background-color: {{ section.settings.background_color }};{% endif %}{% if has_custom_text %}color: {{ section.settings.text_color }};{% endif %}\"{% endif %}";
    format!(
        "<div class=\"{slug}-section\" id=\"section-{{{{ section.id }}}}\"{style}>\n  <div class=\"{slug}-section__inner\">\n{}\n  </div>\n</div>",
        body.trim()
    )
}

fn stylesheet(slug: &str, css: &str) -> String {
    let mut out = String::from(STYLESHEET_OPEN);
    out.push('\n');
    if !css.is_empty() {
        out.push_str(css);
        out.push_str("\n\n");
    }
    out.push_str(&format!(".{slug}-section {{\n}}\n\n.{slug}-section__inner {{\n}}\n"));
    out.push_str(STYLESHEET_CLOSE);
    out
}

fn javascript(slug: &str, scripts: &[String], external: &[String]) -> String {
    let mut out = String::from(JAVASCRIPT_OPEN);
    out.push('\n');
    for (i, script) in scripts.iter().enumerate() {
        out.push_str(&format!("// Inline script {}\n{}\n\n", i + 1, script));
    }
    if !external.is_empty() {
        out.push_str("// External scripts referenced by the source page (load them from the theme layout):\n");
        for url in external {
            out.push_str(&format!("// {url}\n"));
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "(function () {{
  function init(root) {{
    if (!root) return;
    root.classList.add('is-ready');
  }}
  document.addEventListener('DOMContentLoaded', function () {{
    init(document.querySelector('.{slug}-section'));
  }});
  document.addEventListener('shopify:section:load', function (event) {{
    init(event.target.querySelector('.{slug}-section'));
  }});
}})();
"
    ));
    out.push_str(JAVASCRIPT_CLOSE);
    out
}

pub fn assemble_template(parts: &TemplateParts<'_>) -> Result<String, ConvertError> {
    let schema = serde_json::to_string_pretty(parts.schema)?;
    Ok([
        header_comment(parts.slug, parts.source_name),
        PROLOGUE.to_string(),
        wrapper(parts.slug, parts.body),
        format!("{SCHEMA_OPEN}\n{schema}\n{SCHEMA_CLOSE}"),
        stylesheet(parts.slug, parts.css),
        javascript(parts.slug, parts.scripts, parts.external_scripts),
    ]
    .join("\n\n")
        + "\n")
}

/// Byte range of the text between the schema delimiters.
pub fn schema_range(liquid: &str) -> Option<(usize, usize)> {
    let open = liquid.find(SCHEMA_OPEN)? + SCHEMA_OPEN.len();
    let close = open + liquid[open..].find(SCHEMA_CLOSE)?;
    Some((open, close))
}

pub fn schema_segment(liquid: &str) -> Option<&str> {
    schema_range(liquid).map(|(start, end)| &liquid[start..end])
}

/// Replaces the schema body, keeping everything else byte for byte.
pub fn replace_schema_segment(liquid: &str, segment: &str) -> Option<String> {
    let (start, end) = schema_range(liquid)?;
    Some(format!("{}\n{}\n{}", &liquid[..start], segment.trim(), &liquid[end..]))
}
