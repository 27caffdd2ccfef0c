// ABOUTME: Hamburger menu toggle for the portfolio navigation
// ABOUTME: Flips the open state class on the menu links and the hamburger icon

use crate::dom::{Document, Selector};
use crate::errors::Result;

pub const MENU_LINKS: &str = ".menu-links";
pub const HAMBURGER_ICON: &str = ".hamburger-icon";
pub const OPEN_CLASS: &str = "open";

/// State after a toggle; `None` where the element is missing from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MenuState {
    pub links_open: Option<bool>,
    pub icon_open: Option<bool>,
}

/// Toggle `open` on the first `.menu-links` and the first `.hamburger-icon`.
///
/// Each element is flipped on its own, so a page whose classes have drifted
/// apart stays drifted.
pub fn toggle_menu(doc: &mut Document) -> Result<MenuState> {
    toggle_with(|selector| toggle_first(doc, selector))
}

/// Run the toggle through `toggle`, which flips [`OPEN_CLASS`] on the first
/// element matching a selector and reports whether it is now set. The page
/// binding passes a live-DOM toggle here.
pub fn toggle_with<E>(
    mut toggle: impl FnMut(&str) -> std::result::Result<Option<bool>, E>,
) -> std::result::Result<MenuState, E> {
    Ok(MenuState {
        links_open: toggle(MENU_LINKS)?,
        icon_open: toggle(HAMBURGER_ICON)?,
    })
}

fn toggle_first(doc: &mut Document, selector: &str) -> Result<Option<bool>> {
    let selector = Selector::parse(selector)?;
    let Some(path) = doc.select_first(&selector) else {
        return Ok(None);
    };
    Ok(doc
        .element_mut(&path)
        .map(|element| element.toggle_class(OPEN_CLASS)))
}
