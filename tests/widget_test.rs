use folio::carousel::{Activity, CarouselSettings, PointerSource, TimerKind};
use folio::headless::{advance_time, ManualTimers, RecordingSurface};
use folio::viewport::Breakpoints;
use folio::{default_rules, transform_page, Document};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn portfolio(about_cards: usize) -> Document {
    let cards: String = (0..about_cards)
        .map(|i| format!("<div class=\"details-container\"><h3>Card {}</h3></div>", i))
        .collect();
    Document::parse(&format!(
        "<html><body><section id=\"about\"><div class=\"about-containers\">{}</div></section></body></html>",
        cards
    ))
    .expect("Failed to parse page")
}

#[test]
fn test_installed_carousel_drives_from_plan() {
    init();
    let mut doc = portfolio(5);
    let (plans, _) = transform_page(&mut doc, &default_rules(), 1440, &Breakpoints::default())
        .expect("Failed to transform page");
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].slide_count, 5);
    assert_eq!(plans[0].indicator_count, 3);

    let mut carousel = plans[0].instantiate(
        1440,
        CarouselSettings::default(),
        RecordingSurface::for_plan(&plans[0]),
        ManualTimers::default(),
    );
    assert_eq!(carousel.max_index(), 2);
    assert_eq!(carousel.surface().active_indicator, Some(0));
    assert!(carousel.surface().controls_enabled);

    advance_time(&mut carousel, 8000);
    assert_eq!(carousel.current_index(), 2);
    assert_eq!(carousel.surface().active_indicator, Some(2));
    advance_time(&mut carousel, 4000);
    assert_eq!(carousel.current_index(), 0);
}

#[test]
fn test_drag_of_51px_advances_49px_does_not() {
    init();
    let mut doc = portfolio(5);
    let (plans, _) =
        transform_page(&mut doc, &default_rules(), 1440, &Breakpoints::default()).unwrap();
    let new_carousel = || {
        plans[0].instantiate(
            1440,
            CarouselSettings::default(),
            RecordingSurface::for_plan(&plans[0]),
            ManualTimers::default(),
        )
    };

    let mut far = new_carousel();
    far.drag_start(400.0, PointerSource::Touch);
    far.drag_move(349.0);
    far.drag_end();
    assert_eq!(far.current_index(), 1);

    let mut near = new_carousel();
    near.drag_start(400.0, PointerSource::Mouse);
    near.drag_move(351.0);
    near.drag_end();
    assert_eq!(near.current_index(), 0);
    assert!(matches!(near.activity(), Activity::Playing { .. }));
}

#[test]
fn test_double_start_leaves_one_timer_pair() {
    init();
    let mut doc = portfolio(4);
    let (plans, _) =
        transform_page(&mut doc, &default_rules(), 1000, &Breakpoints::default()).unwrap();
    let mut carousel = plans[0].instantiate(
        1000,
        CarouselSettings::default(),
        RecordingSurface::for_plan(&plans[0]),
        ManualTimers::default(),
    );
    carousel.start_autoplay();
    carousel.start_autoplay();
    assert_eq!(carousel.timers().live_count(TimerKind::Autoplay), 1);
    assert_eq!(carousel.timers().live_count(TimerKind::Progress), 1);
}

#[test]
fn test_resize_clamps_position() {
    init();
    let mut doc = portfolio(6);
    let (plans, _) =
        transform_page(&mut doc, &default_rules(), 500, &Breakpoints::default()).unwrap();
    assert_eq!(plans[0].indicator_count, 6);
    let mut carousel = plans[0].instantiate(
        500,
        CarouselSettings::default(),
        RecordingSurface::for_plan(&plans[0]),
        ManualTimers::default(),
    );
    carousel.go_to(5);
    carousel.resize(1000);
    assert_eq!(carousel.max_index(), 4);
    assert_eq!(carousel.current_index(), 4);
    assert_eq!(carousel.surface().offset_percent, -200.0);
    carousel.resize(1300);
    assert_eq!(carousel.current_index(), 3);
}

#[test]
fn test_three_children_below_more_than_three() {
    init();
    let html = |n: usize| {
        let items: String = (0..n).map(|i| format!("<article>{}</article>", i)).collect();
        format!(
            "<html><body><section id=\"certifications\"><div class=\"about-containers\">{}</div></section></body></html>",
            items
        )
    };

    let mut three = Document::parse(&html(3)).unwrap();
    let (plans, outcomes) =
        transform_page(&mut three, &default_rules(), 1440, &Breakpoints::default()).unwrap();
    assert!(plans.is_empty());
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].converted);
    assert_eq!(three.to_html(), html(3));

    let mut four = Document::parse(&html(4)).unwrap();
    let (plans, _) =
        transform_page(&mut four, &default_rules(), 1440, &Breakpoints::default()).unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].id, "certifications-carousel");
}
