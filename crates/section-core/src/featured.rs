use kuchiki::NodeRef;
use serde_json::json;
use tracing::debug;

use crate::blocks::locate;
use crate::config::ConvertOptions;
use crate::dom;
use crate::signals::{product_signals, sibling_groups};
use crate::types::{PageType, SchemaSetting, SettingType};

const MIN_PRODUCTS: usize = 2;
const MAX_PRODUCTS: usize = 12;

#[derive(Debug, Default)]
pub struct FeaturedPass {
    /// The retained product fragment, now a loop body.
    pub region: Option<NodeRef>,
    pub settings: Vec<SchemaSetting>,
    pub changes: Vec<String>,
}

fn featured_group(root: &NodeRef, min_confidence: f64) -> Option<Vec<NodeRef>> {
    sibling_groups(root).into_iter().find_map(|group| {
        let products: Vec<NodeRef> = group
            .into_iter()
            .filter(|m| product_signals(m).confidence() + f64::EPSILON >= min_confidence)
            .collect();
        (products.len() >= MIN_PRODUCTS).then_some(products)
    })
}

fn bind_product(card: &NodeRef) {
    let found = locate(card);
    if let Some(heading) = &found.heading {
        dom::set_text(heading, "{{ product.title }}");
    }
    if let Some(price) = &found.price {
        dom::set_text(price, "{{ product.price | money }}");
    }
    if let Some(img) = &found.image {
        dom::set_attr(img, "src", "{{ product.featured_image | image_url: width: 600 }}");
        dom::set_attr(img, "alt", "{{ product.featured_image.alt | escape }}");
        for attr in ["srcset", "data-src", "data-srcset", "sizes"] {
            dom::remove_attr(img, attr);
        }
    }
    if let Some((first, rest)) = found.description.split_first() {
        dom::set_text(first, "{{ product.description | strip_html | truncate: 120 }}");
        for p in rest {
            p.detach();
        }
    }
    for anchor in dom::select(card, "a") {
        dom::set_attr(&anchor, "href", "{{ product.url }}");
    }
}

/// Swaps the first group of static product-like siblings for a loop over a
/// real product source.
pub fn replace_featured_products(root: &NodeRef, page_type: PageType, options: &ConvertOptions) -> FeaturedPass {
    let mut pass = FeaturedPass::default();
    let Some(products) = featured_group(root, options.featured_min_confidence) else {
        debug!("no featured products found");
        return pass;
    };
    let Some((keep, rest)) = products.split_first() else {
        return pass;
    };
    let count = products.len().clamp(MIN_PRODUCTS, MAX_PRODUCTS);

    bind_product(keep);
    for extra in rest {
        extra.detach();
    }
    let source = page_type.product_source();
    dom::wrap_with(
        keep,
        &format!("{{%- for product in {source} limit: section.settings.featured_products_count -%}}"),
        "{%- endfor -%}",
    );

    if page_type != PageType::Collection {
        pass.settings
            .push(SchemaSetting::new(SettingType::Collection, "featured_collection", "Featured collection"));
    }
    pass.settings.push(SchemaSetting::range(
        "featured_products_count",
        "Products to show",
        json!(MIN_PRODUCTS),
        json!(MAX_PRODUCTS),
        json!(1),
        json!(count),
    ));
    pass.changes.push(format!(
        "Replaced {} static product cards with a dynamic product loop",
        products.len()
    ));
    pass.region = Some(keep.clone());
    pass
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"<div class="shop-tile"><img src="/mug.jpg"><h3>Mug</h3><span class="price">$12.00</span><a class="btn" href="/mug">Add to cart</a></div>"#;

    #[test]
    fn static_cards_become_product_loop() {
        let doc = dom::parse_document(&format!("<section>{}</section>", CARD.repeat(3)));
        let body = dom::body(&doc);
        let pass = replace_featured_products(&body, PageType::Page, &ConvertOptions::default());
        let html = dom::inner_html(&body);
        assert!(pass.region.is_some());
        assert_eq!(html.matches("shop-tile").count(), 1);
        assert!(html.contains(
            "{%- for product in collections[section.settings.featured_collection].products limit: section.settings.featured_products_count -%}"
        ));
        assert!(html.contains("{{ product.price | money }}"));
        let ids: Vec<&str> = pass.settings.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["featured_collection", "featured_products_count"]);
        assert_eq!(pass.settings[1].default, Some(json!(3)));
    }

    #[test]
    fn collection_pages_loop_over_the_collection() {
        let doc = dom::parse_document(&format!("<section>{}</section>", CARD.repeat(2)));
        let body = dom::body(&doc);
        let pass = replace_featured_products(&body, PageType::Collection, &ConvertOptions::default());
        assert_eq!(pass.settings.len(), 1);
        assert!(dom::inner_html(&body).contains("for product in collection.products limit"));
    }

    #[test]
    fn low_confidence_siblings_are_ignored() {
        let doc = dom::parse_document(r#"<div class="note"><p>a</p></div><div class="note"><p>b</p></div>"#);
        let pass = replace_featured_products(&dom::body(&doc), PageType::Page, &ConvertOptions::default());
        assert!(pass.region.is_none());
        assert!(pass.settings.is_empty());
    }
}
