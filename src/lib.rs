// ABOUTME: Library module for the folio portfolio page tooling.
// ABOUTME: Contains the carousel widget, section factory, menu and contact behaviours.

pub mod carousel;
pub mod config;
pub mod contact;
pub mod dom;
pub mod errors;
pub mod factory;
pub mod headless;
pub mod menu;
pub mod viewport;

#[cfg(not(target_arch = "wasm32"))]
pub mod page;
#[cfg(not(target_arch = "wasm32"))]
pub mod resources;
#[cfg(not(target_arch = "wasm32"))]
pub mod utils;
#[cfg(not(target_arch = "wasm32"))]
pub mod watch;

#[cfg(target_arch = "wasm32")]
pub mod web;


// Reexport common types and functions
pub use carousel::{Carousel, CarouselSettings, Surface, Timers};
pub use config::Config;
pub use dom::{Document, Element, Selector};
pub use errors::{FolioError, Result};
pub use factory::{default_rules, transform_page, CarouselPlan, SectionRule};

#[cfg(not(target_arch = "wasm32"))]
pub use page::{prerender, prerender_file, write_html_to_file, PageOptions};
#[cfg(not(target_arch = "wasm32"))]
pub use resources::ResourceFile;
#[cfg(not(target_arch = "wasm32"))]
pub use watch::{watch_page, WatchConfig};
