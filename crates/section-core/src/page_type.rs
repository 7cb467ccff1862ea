use kuchiki::NodeRef;
use tracing::debug;

use crate::dom;
use crate::signals::{article_score, has_price, product_signals};
use crate::text::normalize_slug;
use crate::types::PageType;

const FILENAME_HINTS: &[(PageType, &[&str])] = &[
    (PageType::Collection, &["shop", "collection", "products", "catalog"]),
    (PageType::Product, &["product", "item"]),
    (PageType::Blog, &["blog", "news", "articles"]),
];

const PRODUCT_CARD_SIGNALS: usize = 3;
const PRODUCT_CARDS: usize = 3;
const SINGLE_PRODUCT_SIGNALS: usize = 3;
const ARTICLE_SIGNALS: usize = 2;
const ARTICLES: usize = 2;

fn filename_hint(name: &str) -> Option<PageType> {
    let slug = normalize_slug(name);
    FILENAME_HINTS
        .iter()
        .find(|(_, words)| words.iter().any(|w| slug.contains(w)))
        .map(|(page_type, _)| *page_type)
}

/// Elements passing `test` that contain no other passing element.
fn innermost(root: &NodeRef, test: impl Fn(&NodeRef) -> bool) -> Vec<NodeRef> {
    let candidates: Vec<NodeRef> = dom::select(root, "*").into_iter().filter(|n| test(n)).collect();
    candidates
        .iter()
        .filter(|c| !candidates.iter().any(|d| d != *c && dom::is_within(d, c)))
        .cloned()
        .collect()
}

fn single_product_score(root: &NodeRef) -> usize {
    let add_to_cart = dom::select(root, "a, button, input[type=submit]").iter().any(|b| {
        let label = format!("{} {}", dom::text(b), dom::attr(b, "value").unwrap_or_default()).to_lowercase();
        label.contains("add to cart") || label.contains("add to bag") || label.contains("buy now")
    }) || dom::select_first(root, "form[action*=cart]").is_some();
    let gallery =
        dom::select_first(root, ".product-gallery, .product-images, .product-image, [class*=product] img").is_some();
    let options = dom::select_first(root, "input[name=quantity], .quantity, select, .variant, [class*=variant]").is_some();
    let details = dom::select_first(
        root,
        ".product-title, .product-description, .product-details, .product-info, [itemtype*=Product]",
    )
    .is_some();
    [has_price(root), add_to_cart, gallery, options, details]
        .iter()
        .filter(|s| **s)
        .count()
}

/// Filename hints win; otherwise the first structural rule that fires.
pub fn classify_page_type(name: &str, root: &NodeRef) -> PageType {
    if let Some(hinted) = filename_hint(name) {
        debug!(?hinted, "page type from filename");
        return hinted;
    }
    let cards = innermost(root, |n| product_signals(n).score() >= PRODUCT_CARD_SIGNALS);
    if cards.len() >= PRODUCT_CARDS {
        return PageType::Collection;
    }
    if single_product_score(root) >= SINGLE_PRODUCT_SIGNALS {
        return PageType::Product;
    }
    let articles = innermost(root, |n| article_score(n) >= ARTICLE_SIGNALS);
    if articles.len() >= ARTICLES {
        return PageType::Blog;
    }
    PageType::Page
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(name: &str, html: &str) -> PageType {
        let doc = dom::parse_document(html);
        classify_page_type(name, &dom::body(&doc))
    }

    #[test]
    fn filename_hint_beats_missing_structure() {
        assert_eq!(classify("summer-collection", "<p>Hello</p>"), PageType::Collection);
        assert_eq!(classify("Our News.html", "<p>Hello</p>"), PageType::Blog);
        assert_eq!(classify("all-products", "<p>x</p>"), PageType::Collection);
        assert_eq!(classify("product-detail", "<p>x</p>"), PageType::Product);
    }

    #[test]
    fn product_cards_imply_collection() {
        let card = r#"<div class="product-card"><img src="/a.jpg"><h3>Mug</h3><span class="price">$9.00</span><a class="btn" href="/a">Buy</a></div>"#;
        let html = format!("<section>{}</section>", card.repeat(4));
        assert_eq!(classify("about", &html), PageType::Collection);
    }

    #[test]
    fn two_product_cards_fall_through() {
        let card = r#"<div class="product-card"><img src="/a.jpg"><h3>Mug</h3><span class="price">$9.00</span><a class="btn" href="/a">View</a></div>"#;
        let two = format!("<section>{}</section>", card.repeat(2));
        assert_eq!(classify("about", &two), PageType::Page);
        let three = format!("<section>{}</section>", card.repeat(3));
        assert_eq!(classify("about", &three), PageType::Collection);
    }

    #[test]
    fn single_product_signals() {
        let html = r#"<div class="product-gallery"><img src="/p.jpg"></div><h1 class="product-title">Lamp</h1><span>$40.00</span><select><option>Red</option></select><button>Add to cart</button>"#;
        assert_eq!(classify("lamp", html), PageType::Product);
    }

    #[test]
    fn articles_imply_blog() {
        let post = r#"<article><h2>Story</h2><p>Once upon a time.</p><a href="/s">Read more</a></article>"#;
        assert_eq!(classify("journal", &post.repeat(2)), PageType::Blog);
        assert_eq!(classify("about", "<h1>About</h1><p>We are a shop.</p>"), PageType::Page);
    }
}
