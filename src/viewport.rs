// ABOUTME: Viewport breakpoints for the carousel widgets
// ABOUTME: Maps a viewport width in CSS pixels to the number of visible slides

/// Width breakpoints separating the one, two and three slide layouts.
///
/// A width at or below `single_max` shows one slide, at or below `double_max`
/// two slides, anything wider three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoints {
    pub single_max: u32,
    pub double_max: u32,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            single_max: 768,
            double_max: 1200,
        }
    }
}

impl Breakpoints {
    /// Number of slides visible side by side at `width`.
    pub fn slides_per_view(&self, width: u32) -> usize {
        if width <= self.single_max {
            1
        } else if width <= self.double_max {
            2
        } else {
            3
        }
    }
}

/// Highest reachable paging offset for `slide_count` slides.
pub fn max_index(slide_count: usize, slides_per_view: usize) -> usize {
    slide_count.saturating_sub(slides_per_view)
}
