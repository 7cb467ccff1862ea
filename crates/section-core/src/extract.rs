use kuchiki::NodeRef;
use tracing::debug;

use crate::dom;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedAssets {
    /// `<style>` contents, byte for byte.
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
    pub external_scripts: Vec<String>,
    pub head_lines: Vec<String>,
}

impl ExtractedAssets {
    pub fn css(&self) -> String {
        self.styles.join("\n\n")
    }
}

/// Pulls styles, scripts and head resources out of the document, detaching
/// them so the remaining body only carries content.
pub fn extract_assets(document: &NodeRef) -> ExtractedAssets {
    let mut assets = ExtractedAssets::default();

    for style in dom::select(document, "style") {
        let css = style.text_contents();
        if !css.trim().is_empty() {
            assets.styles.push(css);
        }
        style.detach();
    }

    for node in dom::select(document, "head link[href], head script[src], body link[rel=stylesheet]") {
        assets.head_lines.push(dom::outer_html(&node));
        node.detach();
    }

    for script in dom::select(document, "script") {
        if let Some(src) = dom::attr(&script, "src") {
            assets.external_scripts.push(src);
            script.detach();
            continue;
        }
        let kind = dom::attr(&script, "type").unwrap_or_default().to_lowercase();
        if is_data_script(&kind) {
            debug!(kind = %kind, "skipping non-executable script");
            script.detach();
            continue;
        }
        let js = script.text_contents();
        if !js.trim().is_empty() {
            assets.scripts.push(js);
        }
        script.detach();
    }

    for node in dom::select(document, "noscript, template") {
        node.detach();
    }

    assets
}

fn is_data_script(kind: &str) -> bool {
    !kind.is_empty()
        && kind != "text/javascript"
        && kind != "module"
        && kind != "application/javascript"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_head_styles_and_scripts() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=Inter">
            <script src="https://code.jquery.com/jquery-3.7.1.min.js"></script>
            <style>.hero { color: red; }</style>
            <script type="application/ld+json">{"@type": "Organization"}</script>
        </head><body>
            <h1>Hi</h1>
            <script>console.log("a");</script>
            <script src="/js/app.js"></script>
        </body></html>"#;
        let doc = dom::parse_document(html);
        let assets = extract_assets(&doc);
        assert_eq!(assets.styles, vec![".hero { color: red; }".to_string()]);
        assert_eq!(assets.scripts, vec![r#"console.log("a");"#.to_string()]);
        assert_eq!(assets.external_scripts, vec!["/js/app.js".to_string()]);
        assert_eq!(assets.head_lines.len(), 2);
        assert!(assets.head_lines[0].starts_with("<link"));
        assert!(assets.head_lines[1].contains("jquery-3.7.1"));
        assert!(dom::select(&doc, "script, style").is_empty());
    }

    #[test]
    fn inline_scripts_keep_their_whitespace() {
        let js = "\n  const x = 1;\n  if (x) {\n    go();\n  }\n";
        let doc = dom::parse_document(&format!("<body><script>{js}</script><style>\n.a {{ }}\n</style></body>"));
        let assets = extract_assets(&doc);
        assert_eq!(assets.scripts, vec![js.to_string()]);
        assert_eq!(assets.css(), "\n.a { }\n");
    }
}
