use kuchiki::NodeRef;
use tracing::{debug, warn};

use crate::blocks::{strategy_for, BlockInstance};
use crate::catalog::{custom_pattern, fixed_catalog, group_pattern, slide_pattern, BlockPattern};
use crate::config::ConvertOptions;
use crate::dom;
use crate::signals::{shape_score, sibling_groups, SHAPE_THRESHOLD};

/// One qualifying pattern with its matched elements, in document order.
#[derive(Clone, Debug)]
pub struct DetectedBlock {
    pub pattern: BlockPattern,
    pub nodes: Vec<NodeRef>,
    /// Parallel to `nodes`; captured before any rewrite.
    pub instances: Vec<BlockInstance>,
}

#[derive(Debug, Default)]
pub struct Detection {
    pub blocks: Vec<DetectedBlock>,
    pub warnings: Vec<String>,
}

struct Detector {
    detection: Detection,
    claimed: Vec<NodeRef>,
}

impl Detector {
    fn is_free(&self, node: &NodeRef) -> bool {
        !self.claimed.iter().any(|c| dom::overlaps(node, c))
    }

    fn admit(&mut self, pattern: BlockPattern, mut nodes: Vec<NodeRef>) {
        if nodes.len() < pattern.min_instances {
            debug!(kind = %pattern.kind, found = nodes.len(), "pattern below minimum");
            return;
        }
        if self.detection.blocks.iter().any(|b| b.pattern.kind == pattern.kind) {
            warn!(kind = %pattern.kind, "duplicate block type dropped");
            self.detection
                .warnings
                .push(format!("Duplicate block type '{}' dropped", pattern.kind));
            return;
        }
        self.claimed.extend(nodes.iter().cloned());
        if nodes.len() > pattern.max_instances {
            warn!(kind = %pattern.kind, found = nodes.len(), max = pattern.max_instances, "block instances capped");
            self.detection.warnings.push(format!(
                "Block type '{}' has {} instances; kept the first {}",
                pattern.kind,
                nodes.len(),
                pattern.max_instances
            ));
            nodes.truncate(pattern.max_instances);
        }
        let strategy = strategy_for(pattern.role);
        let instances = nodes.iter().map(|n| strategy.extract(n)).collect();
        debug!(kind = %pattern.kind, instances = nodes.len(), "block detected");
        self.detection.blocks.push(DetectedBlock {
            pattern,
            nodes,
            instances,
        });
    }

    fn evaluate(&mut self, root: &NodeRef, pattern: BlockPattern) {
        let nodes = match dom::select_all(root, &pattern.selector) {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(kind = %pattern.kind, %err, "pattern skipped");
                self.detection
                    .warnings
                    .push(format!("Pattern '{}' skipped: {err}", pattern.kind));
                return;
            }
        };
        let matched: Vec<NodeRef> = nodes
            .into_iter()
            .filter(|n| self.is_free(n) && pattern.accepts(n))
            .collect();
        self.admit(pattern, outermost(matched));
    }
}

/// Drops matches nested inside another match of the same set.
fn outermost(nodes: Vec<NodeRef>) -> Vec<NodeRef> {
    nodes
        .iter()
        .filter(|n| !n.ancestors().any(|a| nodes.contains(&a)))
        .cloned()
        .collect()
}

/// Runs the catalog, custom patterns, slides and structural groups against
/// `root` in that order. Reads the tree only.
pub fn detect_blocks(root: &NodeRef, options: &ConvertOptions, excluded: &[NodeRef]) -> Detection {
    let mut detector = Detector {
        detection: Detection::default(),
        claimed: excluded.to_vec(),
    };

    for pattern in fixed_catalog() {
        detector.evaluate(root, pattern);
    }
    for custom in &options.custom_patterns {
        detector.evaluate(root, custom_pattern(custom));
    }
    detector.evaluate(root, slide_pattern());

    if options.structural_groups {
        let groups: Vec<Vec<NodeRef>> = sibling_groups(root)
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .filter(|m| shape_score(m) >= SHAPE_THRESHOLD)
                    .collect::<Vec<_>>()
            })
            .filter(|group| group.len() >= 2)
            .collect();
        for (i, group) in groups.iter().enumerate() {
            let wraps_inner = groups.iter().enumerate().any(|(j, other)| {
                i != j
                    && other
                        .iter()
                        .any(|o| group.iter().any(|g| o != g && dom::is_within(o, g)))
            });
            if wraps_inner {
                continue;
            }
            let members: Vec<NodeRef> = group.iter().filter(|m| detector.is_free(m)).cloned().collect();
            if members.len() >= 2 {
                detector.admit(group_pattern(&members), members);
            }
        }
    }

    detector.detection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CustomPattern;

    fn detect(html: &str) -> Detection {
        let doc = dom::parse_document(html);
        detect_blocks(&dom::body(&doc), &ConvertOptions::default(), &[])
    }

    fn kinds(detection: &Detection) -> Vec<&str> {
        detection.blocks.iter().map(|b| b.pattern.kind.as_str()).collect()
    }

    #[test]
    fn single_card_is_not_a_block() {
        let d = detect(r#"<div class="testimonial"><p>Only one</p></div>"#);
        assert!(d.blocks.is_empty());
    }

    #[test]
    fn singleton_roles_qualify_alone() {
        let d = detect(
            r#"<header><a href="/">Home</a></header><div class="footer-column"><a href="/a">A</a></div>"#,
        );
        assert_eq!(kinds(&d), vec!["header", "footer_column"]);
    }

    #[test]
    fn claimed_nodes_are_not_matched_twice() {
        let d = detect(
            r#"<div class="testimonial card"><p>A</p></div><div class="testimonial card"><p>B</p></div>"#,
        );
        assert_eq!(kinds(&d), vec!["testimonial"]);
        assert_eq!(d.blocks[0].nodes.len(), 2);
    }

    #[test]
    fn instances_beyond_max_are_capped_with_warning() {
        let html = r#"<div class="testimonial"><p>x</p></div>"#.repeat(8);
        let d = detect(&html);
        assert_eq!(d.blocks[0].nodes.len(), 6);
        assert_eq!(d.warnings.len(), 1);
    }

    #[test]
    fn structural_groups_use_shared_class() {
        let member = r#"<div class="perk"><img src="/p.png"><h3>Perk</h3><p>Nice perk.</p><a href="/p">Go</a></div>"#;
        let d = detect(&format!("<section>{}</section>", member.repeat(3)));
        assert_eq!(kinds(&d), vec!["perk"]);
        assert_eq!(d.blocks[0].instances.len(), 3);
    }

    #[test]
    fn slides_need_two_qualifying_members() {
        let slide = r#"<div class="slide"><img src="/s.jpg"><h2>Summer sale</h2></div>"#;
        let d = detect(&format!(r#"<div class="slider">{}</div>"#, slide.repeat(2)));
        assert_eq!(kinds(&d), vec!["slide"]);
        assert_eq!(d.blocks[0].nodes.len(), 2);

        let d = detect(&format!(r#"<div class="slider">{slide}<div class="slide"><span>Soon</span></div></div>"#));
        assert!(d.blocks.is_empty());
    }

    #[test]
    fn duplicate_types_keep_first() {
        let doc = dom::parse_document(
            r#"<div class="feature"><p>a</p></div><div class="feature"><p>b</p></div><div class="perk"><p>c</p></div><div class="perk"><p>d</p></div>"#,
        );
        let options = ConvertOptions {
            custom_patterns: vec![CustomPattern {
                kind: "feature".to_string(),
                name: None,
                selector: ".perk".to_string(),
                max_instances: 12,
                min_instances: 2,
            }],
            ..ConvertOptions::default()
        };
        let d = detect_blocks(&dom::body(&doc), &options, &[]);
        assert_eq!(kinds(&d), vec!["feature"]);
        assert!(d.blocks[0].nodes.iter().all(|n| dom::class_contains(n, "feature")));
        assert!(d.warnings[0].contains("Duplicate"));
    }

    #[test]
    fn excluded_regions_are_skipped() {
        let doc = dom::parse_document(
            r#"<div id="skip"><div class="feature"><p>a</p></div><div class="feature"><p>b</p></div></div>"#,
        );
        let skip = dom::select_first(&doc, "#skip").expect("skip");
        let d = detect_blocks(&dom::body(&doc), &ConvertOptions::default(), &[skip]);
        assert!(d.blocks.is_empty());
    }
}
