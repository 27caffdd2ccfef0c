// ABOUTME: Carousel factory turning static content grids into carousel markup
// ABOUTME: Evaluates per-section rules and rewrites qualifying containers in a snapshot

use crate::carousel::{Carousel, CarouselSettings, Surface, Timers};
use crate::dom::{Document, Element, Node, Selector};
use crate::errors::{FolioError, Result};
use crate::viewport::{self, Breakpoints};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::Path;

/// Minimum size a container must have to become a carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    MoreThan(usize),
    AtLeast(usize),
}

impl Threshold {
    pub fn admits(&self, child_count: usize) -> bool {
        match *self {
            Threshold::MoreThan(n) => child_count > n,
            Threshold::AtLeast(n) => child_count >= n,
        }
    }

    /// Parse `>N` or `>=N`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(n) = text.strip_prefix(">=") {
            return n.trim().parse().ok().map(Threshold::AtLeast);
        }
        text.strip_prefix('>')
            .and_then(|n| n.trim().parse().ok())
            .map(Threshold::MoreThan)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::MoreThan(n) => write!(f, ">{}", n),
            Threshold::AtLeast(n) => write!(f, ">={}", n),
        }
    }
}

/// Whether a rule converts only the first match or every match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    First,
    /// Every match; ids get the match's position appended.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRule {
    pub selector: String,
    pub threshold: Threshold,
    pub id: String,
    pub scope: MatchScope,
}

impl SectionRule {
    pub fn new(selector: &str, threshold: Threshold, id: &str, scope: MatchScope) -> Self {
        Self {
            selector: selector.to_string(),
            threshold,
            id: id.to_string(),
            scope,
        }
    }

    /// Id of the carousel built from the `match_index`-th match.
    fn carousel_id(&self, match_index: usize) -> String {
        match self.scope {
            MatchScope::First => self.id.clone(),
            MatchScope::All => format!("{}-{}", self.id, match_index),
        }
    }

    /// Decide the matches of this rule, given the element-child counts of the
    /// matched containers in document order. Matches beyond the rule's scope
    /// get no outcome. Both the snapshot transform and the page binding
    /// convert exactly the outcomes marked `converted`.
    pub fn evaluate(&self, child_counts: &[usize]) -> Vec<SectionOutcome> {
        let considered = match self.scope {
            MatchScope::First => child_counts.len().min(1),
            MatchScope::All => child_counts.len(),
        };
        child_counts[..considered]
            .iter()
            .enumerate()
            .map(|(match_index, &child_count)| SectionOutcome {
                selector: self.selector.clone(),
                carousel_id: self.carousel_id(match_index),
                child_count,
                threshold: self.threshold,
                converted: self.threshold.admits(child_count),
            })
            .collect()
    }
}

/// The portfolio's section table, in evaluation order.
pub fn default_rules() -> Vec<SectionRule> {
    use MatchScope::{All, First};
    use Threshold::{AtLeast, MoreThan};
    vec![
        SectionRule::new("#about .about-containers", MoreThan(2), "about-carousel", First),
        SectionRule::new(
            "#certifications .about-containers",
            MoreThan(3),
            "certifications-carousel",
            First,
        ),
        SectionRule::new(".article-container", MoreThan(3), "experience-carousel", All),
        SectionRule::new(
            "#about .about-containers",
            MoreThan(3),
            "about-experience-carousel",
            First,
        ),
        SectionRule::new("#projects .about-containers", AtLeast(3), "projects-carousel", First),
    ]
}

/// Parse a rules file: `selector | threshold | id | first|all` per line,
/// with `//` starting a comment line.
pub fn parse_rules(text: &str) -> Result<Vec<SectionRule>> {
    let mut rules = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        let rule_error = |message: String| FolioError::RuleError {
            line: number + 1,
            message,
        };
        if fields.len() != 4 {
            return Err(rule_error(format!("expected 4 fields, found {}", fields.len())));
        }
        Selector::parse(fields[0]).map_err(|e| rule_error(e.to_string()))?;
        let threshold = Threshold::parse(fields[1])
            .ok_or_else(|| rule_error(format!("bad threshold {:?}", fields[1])))?;
        if fields[2].is_empty() {
            return Err(rule_error("empty carousel id".to_string()));
        }
        let scope = match fields[3].to_ascii_lowercase().as_str() {
            "first" => MatchScope::First,
            "all" => MatchScope::All,
            other => return Err(rule_error(format!("bad scope {:?}", other))),
        };
        rules.push(SectionRule::new(fields[0], threshold, fields[2], scope));
    }
    Ok(rules)
}

pub fn load_rules(path: &Path) -> Result<Vec<SectionRule>> {
    if !path.exists() {
        return Err(FolioError::PathNotFoundError(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    parse_rules(&text)
}

/// What the factory did with one matched container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOutcome {
    pub selector: String,
    pub carousel_id: String,
    pub child_count: usize,
    pub threshold: Threshold,
    pub converted: bool,
}

/// A carousel installed by the factory, enough to construct its widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselPlan {
    pub id: String,
    pub slide_count: usize,
    pub indicator_count: usize,
}

impl CarouselPlan {
    /// Construct the widget bound to this carousel's markup.
    pub fn instantiate<S: Surface, T: Timers>(
        &self,
        viewport_width: u32,
        settings: CarouselSettings,
        surface: S,
        timers: T,
    ) -> Carousel<S, T> {
        Carousel::new(self.slide_count, viewport_width, settings, surface, timers)
    }
}

/// Number of position indicators for `slide_count` slides at this layout.
pub fn indicator_count(slide_count: usize, slides_per_view: usize) -> usize {
    viewport::max_index(slide_count, slides_per_view) + 1
}

/// Carousel markup with an empty `carousel-wrapper`.
pub fn carousel_skeleton(id: &str, indicator_count: usize) -> Element {
    let nav = Element::new("div")
        .with_class("carousel-nav")
        .with_child(
            Element::new("button")
                .with_class("carousel-btn carousel-prev")
                .with_attr("aria-label", "Previous slide")
                .with_child(Node::text("\u{2039}")),
        )
        .with_child(
            Element::new("button")
                .with_class("carousel-btn carousel-next")
                .with_attr("aria-label", "Next slide")
                .with_child(Node::text("\u{203a}")),
        );

    let mut dots = Element::new("div").with_class("carousel-dots");
    for i in 0..indicator_count {
        let mut dot = Element::new("button")
            .with_class("carousel-dot")
            .with_attr("aria-label", &format!("Go to slide group {}", i + 1));
        if i == 0 {
            dot.add_class("active");
        }
        dots.children.push(dot.into());
    }

    let progress = Element::new("div")
        .with_class("carousel-progress")
        .with_child(Element::new("div").with_class("carousel-progress-bar"));

    Element::new("div")
        .with_class("carousel-container")
        .with_attr("id", id)
        .with_child(Element::new("div").with_class("carousel-wrapper"))
        .with_child(nav)
        .with_child(dots)
        .with_child(progress)
}

/// Wrap `item` in its own slide.
pub fn slide(item: Element) -> Element {
    Element::new("div").with_class("carousel-slide").with_child(item)
}

/// Rebuild `container` as a carousel, one slide per child element.
pub fn convert_to_carousel(
    container: Element,
    id: &str,
    slides_per_view: usize,
) -> (Element, CarouselPlan) {
    let items: Vec<Element> = container
        .children
        .into_iter()
        .filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
        .collect();
    let plan = CarouselPlan {
        id: id.to_string(),
        slide_count: items.len(),
        indicator_count: indicator_count(items.len(), slides_per_view),
    };

    let mut carousel = carousel_skeleton(id, plan.indicator_count);
    if let Some(Node::Element(wrapper)) = carousel.children.first_mut() {
        wrapper.children = items.into_iter().map(|item| slide(item).into()).collect();
    }
    (carousel, plan)
}

/// Run every rule over the document, converting qualifying containers in
/// place. Rules see the document as left by the rules before them.
pub fn transform_page(
    doc: &mut Document,
    rules: &[SectionRule],
    viewport_width: u32,
    breakpoints: &Breakpoints,
) -> Result<(Vec<CarouselPlan>, Vec<SectionOutcome>)> {
    let slides_per_view = breakpoints.slides_per_view(viewport_width);
    let mut plans = Vec::new();
    let mut outcomes = Vec::new();

    for rule in rules {
        let selector = Selector::parse(&rule.selector)?;
        let paths = doc.select_paths(&selector);
        let child_counts: Vec<usize> = paths
            .iter()
            .map(|path| doc.element(path).map_or(0, Element::child_element_count))
            .collect();
        let rule_outcomes = rule.evaluate(&child_counts);
        if rule_outcomes.is_empty() {
            debug!("No container for {}", rule.selector);
            continue;
        }

        // Later matches first, so converting one never moves the paths of
        // the matches still pending.
        let mut rule_plans = Vec::new();
        for (path, outcome) in paths.iter().zip(&rule_outcomes).rev() {
            if !outcome.converted {
                continue;
            }
            let Some(Node::Element(container)) = doc.replace(path, Node::Text(String::new()))
            else {
                continue;
            };
            let (carousel, plan) =
                convert_to_carousel(container, &outcome.carousel_id, slides_per_view);
            doc.replace(path, carousel.into());
            info!(
                "Converted {} into #{} with {} slides",
                rule.selector, plan.id, plan.slide_count
            );
            rule_plans.push(plan);
        }
        rule_plans.reverse();
        plans.extend(rule_plans);
        outcomes.extend(rule_outcomes);
    }

    Ok((plans, outcomes))
}
