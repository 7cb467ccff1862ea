use kuchiki::{traits::*, NodeRef, Selectors};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConvertError;
use crate::text::normalize_whitespace;

static BACKGROUND_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)background(?:-image)?\s*:[^;]*?url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).unwrap()
});

pub fn parse_document(html: &str) -> NodeRef {
    kuchiki::parse_html().one(html.to_string())
}

pub fn body(document: &NodeRef) -> NodeRef {
    document
        .select_first("body")
        .map(|b| b.as_node().clone())
        .unwrap_or_else(|_| document.clone())
}

pub fn select_all(root: &NodeRef, selector: &str) -> Result<Vec<NodeRef>, ConvertError> {
    let matches = root
        .select(selector)
        .map_err(|_| ConvertError::Selector(selector.to_string()))?;
    Ok(matches.map(|m| m.as_node().clone()).collect())
}

/// Like `select_all` for selectors known to be valid; an invalid one matches nothing.
pub fn select(root: &NodeRef, selector: &str) -> Vec<NodeRef> {
    select_all(root, selector).unwrap_or_default()
}

pub fn select_first(root: &NodeRef, selector: &str) -> Option<NodeRef> {
    root.select_first(selector).ok().map(|m| m.as_node().clone())
}

pub fn compile(selector: &str) -> Result<Selectors, ConvertError> {
    Selectors::compile(selector).map_err(|_| ConvertError::Selector(selector.to_string()))
}

pub fn tag_name(node: &NodeRef) -> Option<String> {
    node.as_element().map(|el| el.name.local.to_lowercase())
}

pub fn is_tag(node: &NodeRef, tags: &[&str]) -> bool {
    tag_name(node).is_some_and(|t| tags.contains(&t.as_str()))
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    let el = node.as_element()?;
    let attrs = el.attributes.borrow();
    attrs.get(name).map(|v| v.to_string())
}

pub fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(el) = node.as_element() {
        el.attributes.borrow_mut().insert(name, value.to_string());
    }
}

pub fn remove_attr(node: &NodeRef, name: &str) {
    if let Some(el) = node.as_element() {
        el.attributes.borrow_mut().remove(name);
    }
}

pub fn classes(node: &NodeRef) -> Vec<String> {
    attr(node, "class")
        .map(|c| c.split_whitespace().map(|s| s.to_lowercase()).collect())
        .unwrap_or_default()
}

pub fn class_contains(node: &NodeRef, fragment: &str) -> bool {
    classes(node).iter().any(|c| c.contains(fragment))
}

pub fn text(node: &NodeRef) -> String {
    normalize_whitespace(&node.text_contents())
}

pub fn children_elements(node: &NodeRef) -> Vec<NodeRef> {
    node.children().filter(|c| c.as_element().is_some()).collect()
}

pub fn clear_children(node: &NodeRef) {
    let children: Vec<NodeRef> = node.children().collect();
    for child in children {
        child.detach();
    }
}

pub fn set_text(node: &NodeRef, value: &str) {
    clear_children(node);
    node.append(NodeRef::new_text(value));
}

/// Surround `node` with raw text siblings.
pub fn wrap_with(node: &NodeRef, before: &str, after: &str) {
    node.insert_before(NodeRef::new_text(before));
    node.insert_after(NodeRef::new_text(after));
}

pub fn new_element(tag: &str) -> Option<NodeRef> {
    let holder = kuchiki::parse_html().one(format!("<{tag}></{tag}>"));
    let el = select_first(&holder, tag)?;
    el.detach();
    Some(el)
}

/// Swap `node` for an empty element named `tag` carrying the same attributes.
pub fn retag(node: &NodeRef, tag: &str) -> Option<NodeRef> {
    let el = node.as_element()?;
    let replacement = new_element(tag)?;
    if let Some(new_el) = replacement.as_element() {
        new_el.attributes.borrow_mut().map = el.attributes.borrow().map.clone();
    }
    node.insert_before(replacement.clone());
    node.detach();
    Some(replacement)
}

/// True when `node` is `root` or sits beneath it.
pub fn is_within(node: &NodeRef, root: &NodeRef) -> bool {
    node.inclusive_ancestors().any(|a| a == *root)
}

pub fn is_within_any(node: &NodeRef, roots: &[NodeRef]) -> bool {
    node.inclusive_ancestors().any(|a| roots.contains(&a))
}

pub fn overlaps(a: &NodeRef, b: &NodeRef) -> bool {
    is_within(a, b) || is_within(b, a)
}

pub fn inner_html(node: &NodeRef) -> String {
    node.children().map(|c| c.to_string()).collect::<String>()
}

pub fn outer_html(node: &NodeRef) -> String {
    node.to_string()
}

pub fn background_url(style: &str) -> Option<String> {
    BACKGROUND_URL
        .captures(style)
        .map(|caps| caps[1].trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Replace the first `url(...)` of a background declaration with `replacement`.
pub fn replace_background_url(style: &str, replacement: &str) -> String {
    let Some(whole) = BACKGROUND_URL.find(style) else {
        return style.to_string();
    };
    let Some(offset) = whole.as_str().to_ascii_lowercase().find("url(") else {
        return style.to_string();
    };
    let start = whole.start() + offset;
    format!(
        "{}url({}){}",
        &style[..start],
        replacement,
        &style[whole.end()..]
    )
}
