use pretty_assertions::assert_eq;
use section_core::assemble::schema_segment;
use section_core::{convert, convert_batch, normalize_slug, ConvertError, ConvertOptions, PageType};
use serde_json::{json, Value};

const LANDING: &str = r#"<!doctype html>
<html>
<head>
  <title>Landing</title>
  <link href="https://fonts.googleapis.com/css2?family=Inter:wght@400&display=swap" rel="stylesheet">
  <script src="https://cdn.jsdelivr.net/npm/swiper@9.1/swiper-bundle.min.js"></script>
  <style>.hero { padding: 4rem; }</style>
</head>
<body>
  <section class="hero" style="background-image: url('/img/hero.jpg')">
    <h1>Handmade ceramics</h1>
    <p>Small-batch mugs and bowls, fired in our studio.</p>
    <a class="btn" href="/collections/all">Shop now</a>
  </section>
  <section class="features">
    <div class="feature"><i class="fa fa-leaf"></i><h3>Natural</h3><span>Lead-free glazes only.</span></div>
    <div class="feature"><i class="fa fa-truck"></i><h3>Fast</h3><span>Ships in two days.</span></div>
    <div class="feature"><i class="fa fa-heart"></i><h3>Loved</h3><span>Thousands of happy homes.</span></div>
  </section>
  <script>document.querySelector('.hero').classList.add('ready');</script>
</body>
</html>"#;

fn testimonials(count: usize) -> String {
    let cards: String = (1..=count)
        .map(|i| {
            format!(r#"<div class="testimonial"><p>Quote number {i} is lovely.</p><cite>Client {i}</cite></div>"#)
        })
        .collect();
    format!(r#"<section class="testimonials"><h2>Kind words</h2>{cards}</section>"#)
}

fn template(output: &section_core::ConversionOutput) -> Value {
    serde_json::from_str(&output.json_template).expect("json template")
}

#[test]
fn conversion_is_deterministic() {
    let options = ConvertOptions::default();
    let a = convert(LANDING, "landing.html", &options).expect("convert");
    let b = convert(LANDING, "landing.html", &options).expect("convert");
    assert_eq!(a.liquid_content, b.liquid_content);
    assert_eq!(a.json_template, b.json_template);
}

#[test]
fn slug_names_every_artifact() {
    for name in ["About Us.html", "Summer Collection!!", "landing_page", "  x  "] {
        let output = convert(LANDING, name, &ConvertOptions::default()).expect("convert");
        let slug = normalize_slug(name);
        let schema: Value = serde_json::from_str(schema_segment(&output.liquid_content).expect("schema")).expect("json");
        assert_eq!(schema["class"], json!(slug));
        assert_eq!(template(&output)["sections"]["main"]["type"], json!(slug));
        assert_eq!(output.section_file_name, format!("sections/{slug}.liquid"));
        assert!(output.report.is_consistent());
    }
}

#[test]
fn landing_page_is_fully_templated() {
    let output = convert(LANDING, "landing.html", &ConvertOptions::default()).expect("convert");
    let liquid = &output.liquid_content;

    assert!(liquid.contains("{{ section.settings.heading_1 }}"));
    assert!(liquid.contains("section.settings.hero_background_image"));
    assert!(liquid.contains("{%- if block.type == 'feature' -%}"));
    assert_eq!(liquid.matches(r#"class="feature""#).count(), 1);
    assert!(liquid.contains("{% stylesheet %}\n.hero { padding: 4rem; }"));
    assert!(liquid.contains("// Inline script 1\ndocument.querySelector('.hero')"));
    assert!(!liquid.contains("Handmade ceramics</h1>"));

    let ids: Vec<&str> = output.schema.settings.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(&ids[..2], ["background_color", "text_color"]);
    assert!(ids.contains(&"button_1_url"));
    assert_eq!(output.schema.blocks.len(), 1);
    assert_eq!(output.schema.blocks[0].kind, "feature");
    assert_eq!(output.page_type, PageType::Page);
    assert_eq!(output.template_file_name, "templates/page.landing.json");
    assert_eq!(output.head_content.lines().count(), 2);

    let main = &template(&output)["sections"]["main"];
    assert_eq!(main["settings"]["heading_1"], json!("Handmade ceramics"));
    assert_eq!(main["block_order"].as_array().map(Vec::len), Some(3));
}

#[test]
fn five_testimonials_collapse_into_one_fragment() {
    let output = convert(&testimonials(5), "home", &ConvertOptions::default()).expect("convert");
    let liquid = &output.liquid_content;
    assert_eq!(liquid.matches(r#"class="testimonial""#).count(), 1);
    assert_eq!(liquid.matches("block.type == 'testimonial'").count(), 1);

    let main = &template(&output)["sections"]["main"];
    let order: Vec<&str> = main["block_order"]
        .as_array()
        .expect("order")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(order.len(), 5);
    let authors: Vec<&str> = order
        .iter()
        .map(|id| {
            assert_eq!(main["blocks"][id]["type"], json!("testimonial"));
            main["blocks"][id]["settings"]["author"].as_str().expect("author")
        })
        .collect();
    assert_eq!(authors, vec!["Client 1", "Client 2", "Client 3", "Client 4", "Client 5"]);
}

#[test]
fn first_instance_defines_block_shape() {
    let html = r#"<div class="testimonial"><p>One.</p><cite>A</cite></div>
        <div class="testimonial"><p>Two.</p><cite>B</cite></div>
        <div class="testimonial"><img src="/c.jpg" alt="C"><p>Three.</p></div>"#;
    let output = convert(html, "reviews", &ConvertOptions::default()).expect("convert");
    let block = &output.schema.blocks[0];
    assert!(!block.has("image"));
    let main = &template(&output)["sections"]["main"];
    let third = main["block_order"][2].as_str().expect("id");
    let settings = &main["blocks"][third]["settings"];
    assert!(settings.get("image_src").is_none());
    assert_eq!(settings["author"], json!("A"));
}

#[test]
fn quotes_in_visible_text_keep_schema_parseable() {
    let html = r#"<h1>The "Best" Shop</h1><p>We say "hello" to every customer.</p>"#;
    let output = convert(html, "quotes", &ConvertOptions::default()).expect("convert");
    let segment = schema_segment(&output.liquid_content).expect("schema");
    let schema: Value = serde_json::from_str(segment).expect("schema parses");
    let heading = schema["settings"]
        .as_array()
        .and_then(|s| s.iter().find(|s| s["id"] == "heading_1"))
        .expect("heading");
    assert_eq!(heading["default"], json!("The \"Best\" Shop"));
}

#[test]
fn filename_hint_and_structure_pick_page_type() {
    let plain = convert("<p>Sunny things for sunny days.</p>", "summer-collection", &ConvertOptions::default())
        .expect("convert");
    assert_eq!(plain.page_type, PageType::Collection);
    assert_eq!(plain.template_file_name, "templates/collection.summer-collection.json");
    assert_eq!(plain.schema.enabled_on.templates, vec!["collection".to_string()]);

    let card = r#"<div class="product-card"><img src="/m.jpg"><h3>Mug</h3><span class="price">$18.00</span><a class="btn" href="/products/mug">View</a></div>"#;
    let shop = convert(&card.repeat(4), "about", &ConvertOptions::default()).expect("convert");
    assert_eq!(shop.page_type, PageType::Collection);
}

#[test]
fn empty_input_is_rejected() {
    let options = ConvertOptions::default();
    assert!(matches!(convert("", "home", &options), Err(ConvertError::InvalidInput(_))));
    assert!(matches!(convert("   ", "home", &options), Err(ConvertError::InvalidInput(_))));
    assert!(matches!(convert("<p>x</p>", "", &options), Err(ConvertError::InvalidInput(_))));
}

#[test]
fn unknown_injected_block_is_a_warning() {
    let options = ConvertOptions {
        inject_blocks: vec!["faq_item".to_string(), "time_machine".to_string()],
        ..ConvertOptions::default()
    };
    let output = convert("<h1>Help</h1>", "help", &options).expect("convert");
    assert!(output.schema.blocks.iter().any(|b| b.kind == "faq_item"));
    assert!(output.warnings.iter().any(|w| w.contains("time_machine")));
}

#[test]
fn featured_products_become_a_product_loop() {
    let card = r#"<div class="shop-tile"><img src="/m.jpg"><h3>Mug</h3><span class="price">$18.00</span><a class="btn" href="/m">Add to cart</a></div>"#;
    let html = format!("<section><h2>Bestsellers</h2>{}</section>", card.repeat(2));
    let options = ConvertOptions {
        featured_products: true,
        ..ConvertOptions::default()
    };
    let output = convert(&html, "home", &options).expect("convert");
    assert!(output
        .liquid_content
        .contains("for product in collections[section.settings.featured_collection].products"));
    assert!(output.schema.settings.iter().any(|s| s.id == "featured_products_count"));
    assert!(output.schema.blocks.is_empty());
}

#[test]
fn batch_merges_head_resources() {
    let a = r#"<html><head><link href="https://fonts.googleapis.com/css2?family=Inter&display=swap" rel="stylesheet"><script src="https://cdn.jsdelivr.net/npm/swiper@8.0/swiper-bundle.min.js"></script></head><body><h1>A</h1></body></html>"#;
    let b = r#"<html><head><link href="https://fonts.googleapis.com/css2?family=Inter&display=swap" rel="stylesheet"><script src="https://cdn.jsdelivr.net/npm/swiper@9.1/swiper-bundle.min.js"></script></head><body><h1>B</h1></body></html>"#;
    let batch = convert_batch(&[(a, "a.html"), (b, "b.html")], &ConvertOptions::default()).expect("batch");
    assert_eq!(batch.documents.len(), 2);
    let head = &batch.head_content;
    assert_eq!(head.matches("family=Inter").count(), 1);
    assert!(head.contains("swiper@9.1"));
    assert!(!head.contains("swiper@8.0"));
    assert!(head.find("<!-- Fonts -->") < head.find("<!-- Libraries -->"));
}

#[test]
fn batch_stops_at_first_invalid_document() {
    let result = convert_batch(&[("<p>ok</p>", "a"), ("", "b")], &ConvertOptions::default());
    assert!(matches!(result, Err(ConvertError::InvalidInput(_))));
}

#[test]
fn source_template_syntax_stays_out_of_defaults() {
    let card = r#"<div class="testimonial"><img src="{{ 'a.png' | asset_url }}"><p>Hi {{ customer.name }}, welcome back</p><cite>Ana</cite></div>"#;
    let output = convert(&card.repeat(2), "home", &ConvertOptions::default()).expect("convert");
    let tainted: Vec<&str> = output.schema.blocks[0]
        .settings
        .iter()
        .filter(|s| s.default.as_ref().and_then(Value::as_str).is_some_and(|d| d.contains("{{")))
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(tainted, Vec::<&str>::new());
}

#[test]
fn default_preset_mirrors_page_configuration() {
    let html = format!("<h1>Title</h1>{}", testimonials(2));
    let output = convert(&html, "home", &ConvertOptions::default()).expect("convert");
    let preset = &output.schema.presets[0];
    assert_eq!(preset.name, "Default");
    assert_eq!(preset.settings["heading_1"], json!("Title"));
    let authors: Vec<&Value> = preset.blocks.iter().map(|b| &b.settings["author"]).collect();
    assert_eq!(authors, vec![&json!("Client 1"), &json!("Client 2")]);

    let main = &template(&output)["sections"]["main"];
    assert_eq!(Value::Object(preset.settings.clone()), main["settings"]);
}
