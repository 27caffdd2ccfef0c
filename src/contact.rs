// ABOUTME: Copy-to-clipboard affordance for the contact details
// ABOUTME: Finds copyable links and models the "Copied!" feedback bubble timeline

use crate::dom::{Document, Element, Node, Selector};
use crate::errors::Result;

pub const CONTACT_CONTAINER: &str = ".contact-info-container";
pub const CONTACT_LINK: &str = r#"a[href^="mailto:"], a[href^="tel:"]"#;
pub const FEEDBACK_TEXT: &str = "Copied!";

/// Inline style of the feedback bubble; starts transparent and fades in.
pub const FEEDBACK_STYLE: &str = "position: absolute; top: -30px; left: 50%; \
transform: translateX(-50%); background: var(--primary-color); color: white; \
padding: 0.5rem 1rem; border-radius: 8px; font-size: 0.8rem; font-weight: 600; \
opacity: 0; transition: opacity 0.3s ease; pointer-events: none; z-index: 1000;";

/// Text a click on a contact container copies, if it holds a mail or phone link.
pub fn copy_text(container: &Element, link: &Selector) -> Option<String> {
    container
        .find(link)
        .map(|anchor| link_payload(&anchor.text_content()))
}

/// Clipboard text for a contact link's visible text.
pub fn link_payload(link_text: &str) -> String {
    link_text.trim().to_string()
}

/// What a click should write to the clipboard, or `None` when the page
/// cannot copy.
pub fn clipboard_text(
    link_text: &str,
    has_clipboard: bool,
    secure_context: bool,
) -> Option<String> {
    can_copy(has_clipboard, secure_context).then(|| link_payload(link_text))
}

/// Copyable text of every contact container on the page, in document order.
pub fn copy_targets(doc: &Document) -> Result<Vec<String>> {
    let link = Selector::parse(CONTACT_LINK)?;
    Ok(doc
        .query_all(CONTACT_CONTAINER)?
        .into_iter()
        .filter_map(|container| copy_text(container, &link))
        .collect())
}

/// The clipboard is only touched from a secure context that exposes it.
pub fn can_copy(has_clipboard: bool, secure_context: bool) -> bool {
    has_clipboard && secure_context
}

/// The bubble shown after a successful copy.
pub fn feedback_element() -> Element {
    Element::new("div")
        .with_attr("style", FEEDBACK_STYLE)
        .with_child(Node::text(FEEDBACK_TEXT))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackPhase {
    /// Appended but still transparent.
    Pending,
    Visible,
    Fading,
    Removed,
}

/// When the bubble fades in, starts fading out and is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackTimeline {
    pub show_after_ms: u32,
    pub fade_after_ms: u32,
    pub fade_duration_ms: u32,
}

impl Default for FeedbackTimeline {
    fn default() -> Self {
        Self {
            show_after_ms: 10,
            fade_after_ms: 2000,
            fade_duration_ms: 300,
        }
    }
}

impl FeedbackTimeline {
    pub fn remove_after_ms(&self) -> u32 {
        self.fade_after_ms + self.fade_duration_ms
    }

    pub fn phase_at(&self, elapsed_ms: u32) -> FeedbackPhase {
        if elapsed_ms >= self.remove_after_ms() {
            FeedbackPhase::Removed
        } else if elapsed_ms >= self.fade_after_ms {
            FeedbackPhase::Fading
        } else if elapsed_ms >= self.show_after_ms {
            FeedbackPhase::Visible
        } else {
            FeedbackPhase::Pending
        }
    }

    /// Instants, measured from the append, at which the bubble changes phase.
    pub fn boundaries(&self) -> [u32; 3] {
        [self.show_after_ms, self.fade_after_ms, self.remove_after_ms()]
    }

    /// Target opacity the bubble transitions towards in `phase`.
    pub fn opacity(phase: FeedbackPhase) -> &'static str {
        match phase {
            FeedbackPhase::Visible => "1",
            _ => "0",
        }
    }
}
