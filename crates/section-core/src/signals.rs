use kuchiki::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom;

pub(crate) static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:[$€£¥]\s?\d{1,6}(?:[.,]\d{2})?|\d{1,6}(?:[.,]\d{2})?\s?(?:usd|eur|gbp|€|kr))").unwrap()
});
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4}|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4})\b").unwrap()
});

/// Signals out of five an element needs to count as a block-shaped fragment.
pub(crate) const SHAPE_THRESHOLD: usize = 3;

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";
const CTA: &str = "a, button";
const STRUCTURAL_TAGS: &[&str] = &[
    "html", "body", "main", "section", "header", "footer", "nav", "ul", "ol", "table", "tbody",
    "tr", "form",
];

/// image + heading + paragraph + call-to-action + class attribute.
pub(crate) fn shape_score(node: &NodeRef) -> usize {
    let image = has_image(node);
    let heading = dom::select_first(node, HEADINGS).is_some();
    let paragraph = dom::select_first(node, "p").is_some();
    let cta = dom::select_first(node, CTA).is_some();
    let classed = !dom::classes(node).is_empty();
    [image, heading, paragraph, cta, classed]
        .iter()
        .filter(|s| **s)
        .count()
}

pub(crate) fn has_image(node: &NodeRef) -> bool {
    dom::select_first(node, "img").is_some()
        || dom::attr(node, "style")
            .and_then(|s| dom::background_url(&s))
            .is_some()
}

pub(crate) fn has_price(node: &NodeRef) -> bool {
    dom::select_first(node, ".price, .product-price, [class*=price]").is_some()
        || PRICE_RE.is_match(&dom::text(node))
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct ProductSignals {
    pub image: bool,
    pub price: bool,
    pub rating: bool,
    pub title: bool,
    pub button: bool,
    pub product_class: bool,
}

impl ProductSignals {
    /// Out of 5: image, price-or-rating, title, button, product-ish class.
    pub fn score(&self) -> usize {
        [
            self.image,
            self.price || self.rating,
            self.title,
            self.button,
            self.product_class,
        ]
        .iter()
        .filter(|s| **s)
        .count()
    }

    pub fn confidence(&self) -> f64 {
        let mut total = 0.0;
        if self.image {
            total += 0.2;
        }
        if self.price {
            total += 0.3;
        }
        if self.title {
            total += 0.2;
        }
        if self.button {
            total += 0.15;
        }
        if self.product_class {
            total += 0.15;
        }
        total
    }
}

pub(crate) fn product_signals(node: &NodeRef) -> ProductSignals {
    ProductSignals {
        image: has_image(node),
        price: has_price(node),
        rating: dom::select_first(node, ".rating, .stars, [data-rating]").is_some(),
        title: dom::select_first(node, "h1, h2, h3, h4, h5, h6, .title, .product-title, .product-name")
            .is_some(),
        button: dom::select_first(node, "button, .btn, .button, a[class*=btn], a[class*=cart]")
            .is_some(),
        product_class: dom::classes(node)
            .iter()
            .any(|c| c.contains("product") || c.contains("item") || c.contains("shop")),
    }
}

/// Out of 4: title, paragraph, date, read-more.
pub(crate) fn article_score(node: &NodeRef) -> usize {
    let title = dom::select_first(node, HEADINGS).is_some();
    let paragraph = dom::select_first(node, "p").is_some();
    let text = dom::text(node);
    let date = dom::select_first(node, "time, .date, .post-date").is_some() || DATE_RE.is_match(&text);
    let read_more = dom::select(node, "a").iter().any(|a| {
        let t = dom::text(a).to_lowercase();
        t.contains("read more") || t.contains("continue reading") || t.contains("read article")
    });
    [title, paragraph, date, read_more]
        .iter()
        .filter(|s| **s)
        .count()
}

fn signature(node: &NodeRef) -> Option<String> {
    let tag = dom::tag_name(node)?;
    let mut classes = dom::classes(node);
    if classes.is_empty() {
        return None;
    }
    classes.sort();
    Some(format!("{}.{}", tag, classes.join(".")))
}

/// Element siblings sharing a tag+class signature, in document order.
pub(crate) fn sibling_groups(root: &NodeRef) -> Vec<Vec<NodeRef>> {
    let mut groups = Vec::new();
    let mut parents = vec![root.clone()];
    parents.extend(dom::select(root, "*"));
    for parent in parents {
        let mut by_signature: Vec<(String, Vec<NodeRef>)> = Vec::new();
        for child in dom::children_elements(&parent) {
            if dom::is_tag(&child, STRUCTURAL_TAGS) {
                continue;
            }
            let Some(sig) = signature(&child) else {
                continue;
            };
            match by_signature.iter_mut().find(|(s, _)| *s == sig) {
                Some((_, members)) => members.push(child),
                None => by_signature.push((sig, vec![child])),
            }
        }
        groups.extend(
            by_signature
                .into_iter()
                .map(|(_, members)| members)
                .filter(|members| members.len() >= 2),
        );
    }
    groups
}
