// ABOUTME: Carousel widget state machine shared by the browser binding and the CLI
// ABOUTME: Owns paging, autoplay timers, progress indication and drag gestures

use crate::viewport::{self, Breakpoints};
use log::{debug, trace};

/// Timing and gesture constants of a carousel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarouselSettings {
    /// Period of the autoplay timer.
    pub autoplay_ms: u32,
    /// Period of the progress bar timer.
    pub progress_tick_ms: u32,
    /// Horizontal travel a drag needs before it changes slide.
    pub swipe_threshold_px: f64,
    /// Horizontal travel after which a touch drag stops the page from scrolling.
    pub scroll_lock_px: f64,
    pub breakpoints: Breakpoints,
}

impl Default for CarouselSettings {
    fn default() -> Self {
        Self {
            autoplay_ms: 4000,
            progress_tick_ms: 50,
            swipe_threshold_px: 50.0,
            scroll_lock_px: 30.0,
            breakpoints: Breakpoints::default(),
        }
    }
}

impl CarouselSettings {
    /// Percentage points the progress bar grows per progress tick.
    pub fn progress_increment(&self) -> f64 {
        let ticks = self.autoplay_ms as f64 / self.progress_tick_ms.max(1) as f64;
        100.0 / ticks
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Circular paging over `slide_count` slides with `slides_per_view` visible.
///
/// `current <= max_index` holds after every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    current: usize,
    slide_count: usize,
    slides_per_view: usize,
    max_index: usize,
}

impl Paging {
    pub fn new(slide_count: usize, slides_per_view: usize) -> Self {
        Self {
            current: 0,
            slide_count,
            slides_per_view,
            max_index: viewport::max_index(slide_count, slides_per_view),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    pub fn slides_per_view(&self) -> usize {
        self.slides_per_view
    }

    pub fn max_index(&self) -> usize {
        self.max_index
    }

    /// Step one position, wrapping at either end.
    pub fn advance(&mut self, direction: Direction) {
        self.current = match direction {
            Direction::Forward if self.current < self.max_index => self.current + 1,
            Direction::Forward => 0,
            Direction::Backward if self.current > 0 => self.current - 1,
            Direction::Backward => self.max_index,
        };
    }

    /// Jump to `index`, clamped to the last reachable position.
    pub fn go_to(&mut self, index: usize) {
        self.current = index.min(self.max_index);
    }

    /// Adopt a new layout, pulling the position back if it is now out of range.
    pub fn set_slides_per_view(&mut self, slides_per_view: usize) {
        self.slides_per_view = slides_per_view;
        self.max_index = viewport::max_index(self.slide_count, slides_per_view);
        if self.current > self.max_index {
            self.current = self.max_index;
        }
    }

    /// Horizontal strip offset in percent of the viewport (zero or negative).
    pub fn offset_percent(&self) -> f64 {
        let slide_width = 100.0 / self.slides_per_view.max(1) as f64;
        0.0 - self.current as f64 * slide_width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Autoplay,
    Progress,
}

/// Handle returned by [`Timers::start_interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Repeating timer scheduling.
///
/// When an interval fires the driver calls [`Carousel::on_timer`] with the
/// interval's kind.
pub trait Timers {
    fn start_interval(&mut self, kind: TimerKind, period_ms: u32) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

/// The rendered side of a carousel. Every method must tolerate the
/// corresponding element being absent.
pub trait Surface {
    /// Translate the slide strip by `percent` of its width.
    fn set_offset_percent(&mut self, percent: f64);
    /// Mark exactly the indicator at `index` active.
    fn set_active_indicator(&mut self, index: usize);
    /// Enable the previous/next controls.
    fn enable_controls(&mut self);
    fn has_progress_bar(&self) -> bool;
    fn set_progress_percent(&mut self, percent: f64);
    /// Apply or remove the `dragging` state on the root.
    fn set_dragging(&mut self, dragging: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Touch,
    Mouse,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressTimer {
    pub timer: TimerId,
    pub percent: f64,
}

/// What a carousel is doing. Timers only exist while `Playing`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activity {
    Playing {
        autoplay: TimerId,
        progress: Option<ProgressTimer>,
    },
    Paused,
    Dragging {
        start_x: f64,
        last_x: f64,
        source: PointerSource,
    },
}

/// One carousel instance.
pub struct Carousel<S: Surface, T: Timers> {
    paging: Paging,
    activity: Activity,
    settings: CarouselSettings,
    surface: S,
    timers: T,
}

impl<S: Surface, T: Timers> std::fmt::Debug for Carousel<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Carousel")
            .field("paging", &self.paging)
            .field("activity", &self.activity)
            .finish()
    }
}

impl<S: Surface, T: Timers> Carousel<S, T> {
    /// Build a carousel for the current viewport, render it and start autoplay.
    pub fn new(
        slide_count: usize,
        viewport_width: u32,
        settings: CarouselSettings,
        surface: S,
        timers: T,
    ) -> Self {
        let slides_per_view = settings.breakpoints.slides_per_view(viewport_width);
        let mut carousel = Self {
            paging: Paging::new(slide_count, slides_per_view),
            activity: Activity::Paused,
            settings,
            surface,
            timers,
        };
        debug!(
            "Carousel with {} slides, {} per view, max index {}",
            slide_count,
            slides_per_view,
            carousel.paging.max_index()
        );
        carousel.render();
        carousel.start_autoplay();
        carousel
    }

    pub fn paging(&self) -> &Paging {
        &self.paging
    }

    pub fn current_index(&self) -> usize {
        self.paging.current()
    }

    pub fn max_index(&self) -> usize {
        self.paging.max_index()
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn settings(&self) -> &CarouselSettings {
        &self.settings
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    pub fn next(&mut self) {
        self.advance(Direction::Forward);
    }

    pub fn prev(&mut self) {
        self.advance(Direction::Backward);
    }

    pub fn advance(&mut self, direction: Direction) {
        self.paging.advance(direction);
        self.render();
    }

    /// Jump to a paging offset; out-of-range offsets land on the last one.
    pub fn go_to(&mut self, index: usize) {
        self.paging.go_to(index);
        self.render();
    }

    /// Recompute the layout for a new viewport width. Autoplay is untouched.
    pub fn resize(&mut self, viewport_width: u32) {
        let slides_per_view = self.settings.breakpoints.slides_per_view(viewport_width);
        self.paging.set_slides_per_view(slides_per_view);
        self.surface.set_offset_percent(self.paging.offset_percent());
        self.surface.set_active_indicator(self.paging.current());
    }

    /// Dispatch a fired interval.
    pub fn on_timer(&mut self, kind: TimerKind) {
        if !matches!(self.activity, Activity::Playing { .. }) {
            trace!("Ignoring stale {:?} tick while {:?}", kind, self.activity);
            return;
        }
        match kind {
            TimerKind::Autoplay => self.next(),
            TimerKind::Progress => self.tick_progress(),
        }
    }

    /// (Re)start autoplay, replacing any running timers.
    pub fn start_autoplay(&mut self) {
        self.stop_timers();
        let autoplay = self
            .timers
            .start_interval(TimerKind::Autoplay, self.settings.autoplay_ms);
        let progress = if self.surface.has_progress_bar() {
            self.surface.set_progress_percent(0.0);
            Some(ProgressTimer {
                timer: self
                    .timers
                    .start_interval(TimerKind::Progress, self.settings.progress_tick_ms),
                percent: 0.0,
            })
        } else {
            None
        };
        self.activity = Activity::Playing { autoplay, progress };
    }

    /// Stop autoplay without entering a drag.
    pub fn stop_autoplay(&mut self) {
        if let Activity::Playing { .. } = self.activity {
            self.stop_timers();
            self.activity = Activity::Paused;
        }
    }

    /// Pointer entered the carousel.
    pub fn pointer_enter(&mut self) {
        self.stop_autoplay();
    }

    /// Pointer left the carousel: abandons a drag and resumes autoplay.
    pub fn pointer_leave(&mut self) {
        if let Activity::Dragging { .. } = self.activity {
            self.surface.set_dragging(false);
        }
        self.start_autoplay();
    }

    /// Begin a drag at horizontal position `x`.
    ///
    /// Returns whether the driver should suppress the default action.
    pub fn drag_start(&mut self, x: f64, source: PointerSource) -> bool {
        self.stop_timers();
        self.surface.set_dragging(true);
        self.activity = Activity::Dragging {
            start_x: x,
            last_x: x,
            source,
        };
        source == PointerSource::Mouse
    }

    /// Track a drag. Returns whether the driver should suppress scrolling.
    pub fn drag_move(&mut self, x: f64) -> bool {
        let Activity::Dragging {
            start_x,
            ref mut last_x,
            source,
        } = self.activity
        else {
            return false;
        };
        *last_x = x;
        source == PointerSource::Touch && (start_x - x).abs() > self.settings.scroll_lock_px
    }

    /// Finish a drag, changing slide when the travel exceeds the threshold.
    pub fn drag_end(&mut self) {
        let Activity::Dragging {
            start_x, last_x, ..
        } = self.activity
        else {
            return;
        };
        let diff = start_x - last_x;
        if diff > self.settings.swipe_threshold_px {
            self.next();
        } else if diff < -self.settings.swipe_threshold_px {
            self.prev();
        }
        self.surface.set_dragging(false);
        self.start_autoplay();
    }

    fn render(&mut self) {
        self.surface.set_offset_percent(self.paging.offset_percent());
        self.surface.enable_controls();
        self.surface.set_active_indicator(self.paging.current());
    }

    fn tick_progress(&mut self) {
        let Activity::Playing {
            progress: Some(progress),
            ..
        } = &mut self.activity
        else {
            return;
        };
        progress.percent += self.settings.progress_increment();
        let percent = progress.percent;
        let timer = progress.timer;
        self.surface.set_progress_percent(percent.min(100.0));
        if percent >= 100.0 {
            self.timers.cancel(timer);
            self.surface.set_progress_percent(0.0);
            if let Activity::Playing { progress, .. } = &mut self.activity {
                *progress = None;
            }
        }
    }

    fn stop_timers(&mut self) {
        if let Activity::Playing { autoplay, progress } = self.activity {
            self.timers.cancel(autoplay);
            if let Some(progress) = progress {
                self.timers.cancel(progress.timer);
            }
        }
        if self.surface.has_progress_bar() {
            self.surface.set_progress_percent(0.0);
        }
    }
}

/// CSS `transform` value for a strip offset.
pub fn translate_x(percent: f64) -> String {
    format!("translateX({}%)", percent)
}

/// CSS `width` value for a progress percentage.
pub fn progress_width(percent: f64) -> String {
    format!("{}%", percent)
}
