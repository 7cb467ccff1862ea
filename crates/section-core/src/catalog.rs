use kuchiki::NodeRef;

use crate::config::CustomPattern;
use crate::dom;
use crate::signals::{shape_score, SHAPE_THRESHOLD};
use crate::text::{setting_key, title_case};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockRole {
    Generic,
    Header,
    FooterColumn,
    TeamMember,
    BeforeAfter,
}

#[derive(Clone, Debug)]
pub struct BlockPattern {
    /// Block type slug, unique per run.
    pub kind: String,
    pub name: String,
    pub selector: String,
    pub min_instances: usize,
    pub max_instances: usize,
    pub role: BlockRole,
    pub predicate: Option<fn(&NodeRef) -> bool>,
}

impl BlockPattern {
    pub fn accepts(&self, node: &NodeRef) -> bool {
        self.predicate.map_or(true, |p| p(node))
    }
}

struct CatalogEntry {
    kind: &'static str,
    name: &'static str,
    selector: &'static str,
    min: usize,
    max: usize,
    role: BlockRole,
    predicate: Option<fn(&NodeRef) -> bool>,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        kind: "header",
        name: "Header",
        selector: "header, .site-header, .navbar",
        min: 1,
        max: 1,
        role: BlockRole::Header,
        predicate: Some(has_links),
    },
    CatalogEntry {
        kind: "testimonial",
        name: "Testimonial",
        selector: ".testimonial, .testimonial-card, .review, .review-card",
        min: 2,
        max: 6,
        role: BlockRole::Generic,
        predicate: None,
    },
    CatalogEntry {
        kind: "feature",
        name: "Feature",
        selector: ".feature, .feature-card, .feature-item, .service-card",
        min: 2,
        max: 12,
        role: BlockRole::Generic,
        predicate: None,
    },
    CatalogEntry {
        kind: "product_card",
        name: "Product card",
        selector: ".product-card, .product-item",
        min: 2,
        max: 12,
        role: BlockRole::Generic,
        predicate: None,
    },
    CatalogEntry {
        kind: "pricing_plan",
        name: "Pricing plan",
        selector: ".pricing-card, .pricing-plan, .price-card",
        min: 2,
        max: 4,
        role: BlockRole::Generic,
        predicate: None,
    },
    CatalogEntry {
        kind: "team_member",
        name: "Team member",
        selector: ".team-member, .team-card, .member-card",
        min: 2,
        max: 8,
        role: BlockRole::TeamMember,
        predicate: None,
    },
    CatalogEntry {
        kind: "faq_item",
        name: "FAQ item",
        selector: ".faq-item, .accordion-item",
        min: 2,
        max: 20,
        role: BlockRole::Generic,
        predicate: None,
    },
    CatalogEntry {
        kind: "stat",
        name: "Statistic",
        selector: ".stat, .stat-item, .counter-item",
        min: 2,
        max: 6,
        role: BlockRole::Generic,
        predicate: None,
    },
    CatalogEntry {
        kind: "comparison",
        name: "Before / after",
        selector: ".before-after, .comparison-slider",
        min: 2,
        max: 4,
        role: BlockRole::BeforeAfter,
        predicate: Some(has_two_images),
    },
    CatalogEntry {
        kind: "blog_post",
        name: "Blog post",
        selector: ".blog-post, .post-card, .article-card",
        min: 2,
        max: 6,
        role: BlockRole::Generic,
        predicate: None,
    },
    CatalogEntry {
        kind: "gallery_item",
        name: "Gallery item",
        selector: ".gallery-item",
        min: 2,
        max: 12,
        role: BlockRole::Generic,
        predicate: None,
    },
    CatalogEntry {
        kind: "footer_column",
        name: "Footer column",
        selector: ".footer-column, .footer-col, .footer-links",
        min: 1,
        max: 6,
        role: BlockRole::FooterColumn,
        predicate: Some(has_links),
    },
    CatalogEntry {
        kind: "card",
        name: "Card",
        selector: ".card",
        min: 2,
        max: 12,
        role: BlockRole::Generic,
        predicate: None,
    },
];

pub const SLIDE_SELECTOR: &str = ".slide, .swiper-slide, .carousel-item";
const GROUP_MAX_INSTANCES: usize = 12;

fn has_links(node: &NodeRef) -> bool {
    dom::select_first(node, "a").is_some()
}

fn has_two_images(node: &NodeRef) -> bool {
    dom::select(node, "img").len() >= 2
}

fn has_block_shape(node: &NodeRef) -> bool {
    shape_score(node) >= SHAPE_THRESHOLD
}

pub fn fixed_catalog() -> Vec<BlockPattern> {
    CATALOG
        .iter()
        .map(|e| BlockPattern {
            kind: e.kind.to_string(),
            name: e.name.to_string(),
            selector: e.selector.to_string(),
            min_instances: e.min,
            max_instances: e.max,
            role: e.role,
            predicate: e.predicate,
        })
        .collect()
}

pub fn find_pattern(kind: &str) -> Option<BlockPattern> {
    fixed_catalog().into_iter().find(|p| p.kind == kind)
}

pub fn custom_pattern(custom: &CustomPattern) -> BlockPattern {
    let kind = setting_key(&custom.kind);
    let name = custom
        .name
        .clone()
        .unwrap_or_else(|| title_case(&kind));
    BlockPattern {
        kind,
        name,
        selector: custom.selector.clone(),
        min_instances: custom.min_instances.max(1),
        max_instances: custom.max_instances.max(1),
        role: BlockRole::Generic,
        predicate: None,
    }
}

pub fn slide_pattern() -> BlockPattern {
    BlockPattern {
        kind: "slide".to_string(),
        name: "Slide".to_string(),
        selector: SLIDE_SELECTOR.to_string(),
        min_instances: 2,
        max_instances: GROUP_MAX_INSTANCES,
        role: BlockRole::Generic,
        predicate: Some(has_block_shape),
    }
}

/// Pattern for a structurally discovered sibling group, named after its first class.
pub fn group_pattern(members: &[NodeRef]) -> BlockPattern {
    let first_class = members
        .first()
        .and_then(|m| dom::classes(m).into_iter().next())
        .map(|c| setting_key(&c))
        .filter(|c| !c.is_empty());
    let kind = first_class.unwrap_or_else(|| "content_item".to_string());
    BlockPattern {
        name: title_case(&kind),
        kind,
        selector: String::new(),
        min_instances: 2,
        max_instances: GROUP_MAX_INSTANCES,
        role: BlockRole::Generic,
        predicate: None,
    }
}
