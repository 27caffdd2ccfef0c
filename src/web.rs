// ABOUTME: Browser binding that installs and drives the widgets on a live page
// ABOUTME: Implements the carousel surface and timers over web-sys and wires DOM events

use crate::carousel::{
    self, Carousel, CarouselSettings, PointerSource, Surface, TimerId, TimerKind, Timers,
};
use crate::contact::{self, FeedbackPhase, FeedbackTimeline};
use crate::dom;
use crate::factory;
use crate::menu::{self, MenuState};
use gloo_timers::callback::Interval;
use gloo_timers::future::TimeoutFuture;
use log::{debug, info, warn};
use quick_xml::escape::unescape;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlButtonElement, HtmlElement, MouseEvent, NodeList,
    TouchEvent, Window,
};

pub type WebCarousel = Carousel<DomSurface, BrowserTimers>;

/// Module entry point: hooks page initialisation and exposes `toggleMenu`.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    _ = console_log::init_with_level(log::Level::Info);

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    // Inline `onclick="toggleMenu()"` handlers look the function up on window.
    let toggle = Closure::wrap(Box::new(toggle_menu) as Box<dyn FnMut()>);
    js_sys::Reflect::set(&window, &JsValue::from_str("toggleMenu"), toggle.as_ref())?;
    toggle.forget();

    let ready_state = js_sys::Reflect::get(&document, &JsValue::from_str("readyState"))?;
    if ready_state.as_string().as_deref() == Some("loading") {
        let load_window = window.clone();
        listen(&document, "DOMContentLoaded", move |_| {
            if let Err(e) = initialize(&load_window) {
                warn!("Page initialisation failed: {:?}", e);
            }
        })?;
        Ok(())
    } else {
        initialize(&window)
    }
}

/// Flip the `open` class on the menu links and the hamburger icon.
#[wasm_bindgen(js_name = toggleMenu)]
pub fn toggle_menu() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    match toggle_menu_in(&document) {
        Ok(state) => debug!("Menu toggled: {:?}", state),
        Err(e) => warn!("Could not toggle menu: {:?}", e),
    }
}

/// Live-DOM counterpart of [`menu::toggle_menu`].
pub fn toggle_menu_in(document: &Document) -> Result<MenuState, JsValue> {
    menu::toggle_with(
        |selector| -> Result<Option<bool>, JsValue> {
            match document.query_selector(selector)? {
                Some(element) => Ok(Some(element.class_list().toggle(menu::OPEN_CLASS)?)),
                None => Ok(None),
            }
        },
    )
}

fn initialize(window: &Window) -> Result<(), JsValue> {
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let settings = CarouselSettings::default();

    let installed = install_carousels(&document, viewport_width(window), &settings)?;
    // Prerendered pages already carry the markup, so bind every root present.
    let roots = collect_elements(document.query_selector_all(".carousel-container")?);
    info!(
        "Binding {} carousel(s), {} installed on load",
        roots.len(),
        installed
    );
    for root in roots {
        bind_carousel(window, root, settings)?;
    }

    bind_contact(window, &document)
}

/// Run the section table against the live page. Which containers convert,
/// and under which ids, is decided by [`factory::SectionRule::evaluate`].
pub fn install_carousels(
    document: &Document,
    viewport_width: u32,
    settings: &CarouselSettings,
) -> Result<usize, JsValue> {
    let slides_per_view = settings.breakpoints.slides_per_view(viewport_width);
    let mut installed = 0;
    for rule in factory::default_rules() {
        let containers = collect_elements(document.query_selector_all(&rule.selector)?);
        let child_counts: Vec<usize> = containers
            .iter()
            .map(|container| container.child_element_count() as usize)
            .collect();
        for (container, outcome) in containers.iter().zip(rule.evaluate(&child_counts)) {
            if !outcome.converted {
                debug!(
                    "{} has {} children, needs {}",
                    outcome.selector, outcome.child_count, outcome.threshold
                );
                continue;
            }
            install(document, container, &outcome.carousel_id, slides_per_view)?;
            installed += 1;
        }
    }
    Ok(installed)
}

/// Replace `container` with carousel markup, moving each child element into
/// its own slide.
fn install(
    document: &Document,
    container: &Element,
    id: &str,
    slides_per_view: usize,
) -> Result<(), JsValue> {
    let slide_count = container.child_element_count() as usize;
    let skeleton = factory::carousel_skeleton(
        id,
        factory::indicator_count(slide_count, slides_per_view),
    );
    let root = materialize(document, &skeleton)?;
    if let Some(wrapper) = root.query_selector(".carousel-wrapper")? {
        while let Some(item) = container.first_element_child() {
            let slide = document.create_element("div")?;
            slide.set_class_name("carousel-slide");
            slide.append_child(&item)?;
            wrapper.append_child(&slide)?;
        }
    }
    if let Some(parent) = container.parent_node() {
        parent.replace_child(&root, container)?;
    }
    debug!("Installed #{} with {} slides", id, slide_count);
    Ok(())
}

/// Build live nodes for a snapshot element.
fn materialize(document: &Document, element: &dom::Element) -> Result<Element, JsValue> {
    let node = document.create_element(&element.tag)?;
    for (name, value) in &element.attrs {
        node.set_attribute(name, &unescaped(value))?;
    }
    for child in &element.children {
        match child {
            dom::Node::Element(child) => {
                node.append_child(&materialize(document, child)?)?;
            }
            dom::Node::Text(text) => {
                node.append_child(&document.create_text_node(&unescaped(text)))?;
            }
            dom::Node::Comment(_) | dom::Node::Doctype(_) => {}
        }
    }
    Ok(node)
}

fn unescaped(raw: &str) -> String {
    unescape(raw)
        .map(|text| text.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn collect_elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn viewport_width(window: &Window) -> u32 {
    window
        .inner_width()
        .ok()
        .and_then(|width| width.as_f64())
        .map(|width| width.max(0.0) as u32)
        .unwrap_or(0)
}

fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

/// Event handler running `f` against the carousel. Events that arrive while
/// the carousel is already borrowed are dropped.
fn on(
    carousel: &Rc<RefCell<WebCarousel>>,
    mut f: impl FnMut(&mut WebCarousel, &Event) + 'static,
) -> impl FnMut(Event) + 'static {
    let carousel = Rc::clone(carousel);
    move |event| match carousel.try_borrow_mut() {
        Ok(mut carousel) => f(&mut carousel, &event),
        Err(_) => debug!("Dropped re-entrant {} event", event.type_()),
    }
}

fn touch_x(event: &Event) -> Option<f64> {
    event
        .dyn_ref::<TouchEvent>()
        .and_then(|touch| touch.touches().get(0))
        .map(|touch| f64::from(touch.client_x()))
}

fn mouse_x(event: &Event) -> Option<f64> {
    event
        .dyn_ref::<MouseEvent>()
        .map(|mouse| f64::from(mouse.client_x()))
}

/// Construct the widget for one carousel root and wire its events.
pub fn bind_carousel(
    window: &Window,
    root: Element,
    settings: CarouselSettings,
) -> Result<Rc<RefCell<WebCarousel>>, JsValue> {
    let slide_count = root.query_selector_all(".carousel-slide")?.length() as usize;
    let owner = Rc::new(RefCell::new(Weak::new()));
    let timers = BrowserTimers::new(Rc::clone(&owner));
    let surface = DomSurface::bind(&root)?;
    let carousel = Rc::new(RefCell::new(Carousel::new(
        slide_count,
        viewport_width(window),
        settings,
        surface,
        timers,
    )));
    *owner.borrow_mut() = Rc::downgrade(&carousel);

    if let Some(prev) = root.query_selector(".carousel-prev")? {
        listen(&prev, "click", on(&carousel, |c, _| c.prev()))?;
    }
    if let Some(next) = root.query_selector(".carousel-next")? {
        listen(&next, "click", on(&carousel, |c, _| c.next()))?;
    }
    for (index, dot) in collect_elements(root.query_selector_all(".carousel-dot")?)
        .into_iter()
        .enumerate()
    {
        listen(&dot, "click", on(&carousel, move |c, _| c.go_to(index)))?;
    }

    listen(&root, "mouseenter", on(&carousel, |c, _| c.pointer_enter()))?;
    listen(&root, "mouseleave", on(&carousel, |c, _| c.pointer_leave()))?;

    listen(
        &root,
        "touchstart",
        on(&carousel, |c, event| {
            if let Some(x) = touch_x(event) {
                c.drag_start(x, PointerSource::Touch);
            }
        }),
    )?;
    listen(
        &root,
        "touchmove",
        on(&carousel, |c, event| {
            if let Some(x) = touch_x(event) {
                if c.drag_move(x) {
                    event.prevent_default();
                }
            }
        }),
    )?;
    listen(&root, "touchend", on(&carousel, |c, _| c.drag_end()))?;

    listen(
        &root,
        "mousedown",
        on(&carousel, |c, event| {
            if let Some(x) = mouse_x(event) {
                if c.drag_start(x, PointerSource::Mouse) {
                    event.prevent_default();
                }
            }
        }),
    )?;
    listen(
        &root,
        "mousemove",
        on(&carousel, |c, event| {
            if let Some(x) = mouse_x(event) {
                c.drag_move(x);
            }
        }),
    )?;
    listen(&root, "mouseup", on(&carousel, |c, _| c.drag_end()))?;

    let resize_window = window.clone();
    listen(
        window,
        "resize",
        on(&carousel, move |c, _| c.resize(viewport_width(&resize_window))),
    )?;

    Ok(carousel)
}

/// Carousel markup of one root on the live page.
pub struct DomSurface {
    root: Element,
    wrapper: Option<HtmlElement>,
    buttons: Vec<HtmlButtonElement>,
    dots: Vec<Element>,
    progress_bar: Option<HtmlElement>,
}

impl DomSurface {
    pub fn bind(root: &Element) -> Result<Self, JsValue> {
        let html = |selector: &str| -> Result<Option<HtmlElement>, JsValue> {
            Ok(root
                .query_selector(selector)?
                .and_then(|e| e.dyn_into::<HtmlElement>().ok()))
        };
        let mut buttons = Vec::new();
        for selector in [".carousel-prev", ".carousel-next"] {
            if let Some(button) = root
                .query_selector(selector)?
                .and_then(|e| e.dyn_into::<HtmlButtonElement>().ok())
            {
                buttons.push(button);
            }
        }
        Ok(Self {
            root: root.clone(),
            wrapper: html(".carousel-wrapper")?,
            buttons,
            dots: collect_elements(root.query_selector_all(".carousel-dot")?),
            progress_bar: html(".carousel-progress-bar")?,
        })
    }

    fn set_style(element: &HtmlElement, property: &str, value: &str) {
        if let Err(e) = element.style().set_property(property, value) {
            warn!("Could not set {}: {:?}", property, e);
        }
    }
}

impl Surface for DomSurface {
    fn set_offset_percent(&mut self, percent: f64) {
        if let Some(wrapper) = &self.wrapper {
            Self::set_style(wrapper, "transform", &carousel::translate_x(percent));
        }
    }

    fn set_active_indicator(&mut self, index: usize) {
        for (i, dot) in self.dots.iter().enumerate() {
            let _ = dot.class_list().toggle_with_force("active", i == index);
        }
    }

    fn enable_controls(&mut self) {
        for button in &self.buttons {
            button.set_disabled(false);
        }
    }

    fn has_progress_bar(&self) -> bool {
        self.progress_bar.is_some()
    }

    fn set_progress_percent(&mut self, percent: f64) {
        if let Some(bar) = &self.progress_bar {
            Self::set_style(bar, "width", &carousel::progress_width(percent));
        }
    }

    fn set_dragging(&mut self, dragging: bool) {
        let _ = self.root.class_list().toggle_with_force("dragging", dragging);
    }
}

/// Interval timers dispatching to the carousel that owns them. Dropping an
/// [`Interval`] clears it.
pub struct BrowserTimers {
    owner: Rc<RefCell<Weak<RefCell<WebCarousel>>>>,
    next_id: u64,
    live: HashMap<TimerId, Interval>,
}

impl BrowserTimers {
    fn new(owner: Rc<RefCell<Weak<RefCell<WebCarousel>>>>) -> Self {
        Self {
            owner,
            next_id: 0,
            live: HashMap::new(),
        }
    }
}

impl Timers for BrowserTimers {
    fn start_interval(&mut self, kind: TimerKind, period_ms: u32) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);

        let owner = Rc::clone(&self.owner);
        let interval = Interval::new(period_ms, move || {
            let carousel = owner.borrow().upgrade();
            if let Some(carousel) = carousel {
                if let Ok(mut carousel) = carousel.try_borrow_mut() {
                    carousel.on_timer(kind);
                }
            }
        });
        self.live.insert(id, interval);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.live.remove(&id);
    }
}

fn bind_contact(window: &Window, document: &Document) -> Result<(), JsValue> {
    for container in collect_elements(document.query_selector_all(contact::CONTACT_CONTAINER)?) {
        let Some(link) = container.query_selector(contact::CONTACT_LINK)? else {
            continue;
        };
        let window = window.clone();
        let target = container.clone();
        listen(&container, "click", move |_| {
            let navigator = window.navigator();
            let has_clipboard =
                js_sys::Reflect::has(&navigator, &JsValue::from_str("clipboard")).unwrap_or(false);
            let Some(text) = contact::clipboard_text(
                &link.text_content().unwrap_or_default(),
                has_clipboard,
                window.is_secure_context(),
            ) else {
                return;
            };
            let promise = navigator.clipboard().write_text(&text);
            let window = window.clone();
            let target = target.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    debug!("Clipboard write failed: {:?}", e);
                    return;
                }
                if let Err(e) = show_copy_feedback(&window, &target).await {
                    warn!("Could not show copy feedback: {:?}", e);
                }
            });
        })?;
    }
    Ok(())
}

/// Append the bubble and walk it through the feedback timeline.
async fn show_copy_feedback(window: &Window, container: &Element) -> Result<(), JsValue> {
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    if let Some(container) = container.dyn_ref::<HtmlElement>() {
        container.style().set_property("position", "relative")?;
    }
    let bubble: HtmlElement = materialize(&document, &contact::feedback_element())?.dyn_into()?;
    container.append_child(&bubble)?;

    let timeline = FeedbackTimeline::default();
    let mut elapsed = 0;
    for at in timeline.boundaries() {
        TimeoutFuture::new(at - elapsed).await;
        elapsed = at;
        match timeline.phase_at(at) {
            FeedbackPhase::Removed => bubble.remove(),
            phase => DomSurface::set_style(&bubble, "opacity", FeedbackTimeline::opacity(phase)),
        }
    }
    Ok(())
}
