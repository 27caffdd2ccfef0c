#![cfg(target_arch = "wasm32")]

use folio::carousel::CarouselSettings;
use folio::viewport::Breakpoints;
use folio::web::{bind_carousel, install_carousels, toggle_menu_in};
use folio::{default_rules, transform_page};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, Element, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

const SECTIONS: &str = "<section id=\"about\"><div class=\"about-containers\">\
<div class=\"details-container\">One</div><div class=\"details-container\">Two</div>\
<div class=\"details-container\">Three</div><div class=\"details-container\">Four</div>\
</div></section>\
<section id=\"experience\">\
<div class=\"article-container\"><article>Rust</article><article>Go</article><article>SQL</article></div>\
<div class=\"article-container\"><article>HTML</article><article>CSS</article><article>JS</article><article>Sass</article></div>\
</section>";

fn page(body: &str) -> Document {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .expect("Failed to get document");
    document
        .body()
        .expect("Failed to get body")
        .set_inner_html(body);
    document
}

fn carousel_ids(document: &Document) -> Vec<String> {
    let roots = document.query_selector_all(".carousel-container").unwrap();
    (0..roots.length())
        .filter_map(|i| roots.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .map(|root| root.id())
        .collect()
}

#[wasm_bindgen_test]
fn test_live_install_matches_snapshot_transform() {
    let document = page(SECTIONS);
    let installed = install_carousels(&document, 1440, &CarouselSettings::default()).unwrap();
    assert_eq!(installed, 2);

    let mut snapshot = folio::Document::parse(SECTIONS).unwrap();
    let (plans, _) =
        transform_page(&mut snapshot, &default_rules(), 1440, &Breakpoints::default()).unwrap();
    let expected: Vec<String> = plans.iter().map(|p| p.id.clone()).collect();
    assert_eq!(carousel_ids(&document), expected);

    let slides = document
        .query_selector_all("#about-carousel .carousel-wrapper .carousel-slide")
        .unwrap();
    assert_eq!(slides.length(), 4);
    let dots = document
        .query_selector_all("#about-carousel .carousel-dot")
        .unwrap();
    assert_eq!(dots.length() as usize, plans[0].indicator_count);
    assert_eq!(
        document
            .query_selector_all(".article-container")
            .unwrap()
            .length(),
        1
    );
}

#[wasm_bindgen_test]
fn test_bound_carousel_follows_clicks() {
    let document = page(SECTIONS);
    install_carousels(&document, 1440, &CarouselSettings::default()).unwrap();
    let window = web_sys::window().unwrap();
    let root = document.query_selector("#about-carousel").unwrap().unwrap();
    let carousel = bind_carousel(&window, root, CarouselSettings::default()).unwrap();
    assert_eq!(carousel.borrow().current_index(), 0);

    let next: HtmlElement = document
        .query_selector("#about-carousel .carousel-next")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    next.click();
    assert_eq!(carousel.borrow().current_index(), 1);

    let active = document
        .query_selector_all("#about-carousel .carousel-dot.active")
        .unwrap();
    assert_eq!(active.length(), 1);
    let second = document
        .query_selector("#about-carousel .carousel-dot:nth-child(2)")
        .unwrap()
        .unwrap();
    assert!(second.class_list().contains("active"));
}

#[wasm_bindgen_test]
fn test_toggle_menu_flips_live_classes() {
    let document = page(
        "<div class=\"hamburger-icon\"></div><div class=\"menu-links\"></div>",
    );
    let state = toggle_menu_in(&document).unwrap();
    assert_eq!(state.links_open, Some(true));
    assert_eq!(state.icon_open, Some(true));
    let links = document.query_selector(".menu-links").unwrap().unwrap();
    assert!(links.class_list().contains("open"));

    let state = toggle_menu_in(&document).unwrap();
    assert_eq!(state.links_open, Some(false));
    assert!(!links.class_list().contains("open"));

    let document = page("<div class=\"menu-links\"></div>");
    assert_eq!(toggle_menu_in(&document).unwrap().icon_open, None);
}
