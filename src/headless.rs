// ABOUTME: Headless carousel driver with a virtual clock
// ABOUTME: Records rendered state so carousels can be exercised without a browser

use crate::carousel::{Carousel, Surface, TimerId, TimerKind, Timers};
use crate::factory::CarouselPlan;
use std::collections::BTreeMap;

/// A [`Surface`] that remembers what it was asked to render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSurface {
    pub indicator_count: usize,
    pub has_progress_bar: bool,
    pub offset_percent: f64,
    pub active_indicator: Option<usize>,
    pub progress_percent: f64,
    pub progress_history: Vec<f64>,
    pub dragging: bool,
    pub controls_enabled: bool,
}

impl RecordingSurface {
    pub fn new(indicator_count: usize, has_progress_bar: bool) -> Self {
        Self {
            indicator_count,
            has_progress_bar,
            ..Self::default()
        }
    }

    /// Surface for the markup the factory installs: every carousel gets a
    /// progress bar.
    pub fn for_plan(plan: &CarouselPlan) -> Self {
        Self::new(plan.indicator_count, true)
    }
}

impl Surface for RecordingSurface {
    fn set_offset_percent(&mut self, percent: f64) {
        self.offset_percent = percent;
    }

    fn set_active_indicator(&mut self, index: usize) {
        self.active_indicator = (index < self.indicator_count).then_some(index);
    }

    fn enable_controls(&mut self) {
        self.controls_enabled = true;
    }

    fn has_progress_bar(&self) -> bool {
        self.has_progress_bar
    }

    fn set_progress_percent(&mut self, percent: f64) {
        if self.has_progress_bar {
            self.progress_percent = percent;
            self.progress_history.push(percent);
        }
    }

    fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Interval {
    kind: TimerKind,
    period_ms: u64,
    due_ms: u64,
}

/// Interval timers on a virtual millisecond clock.
#[derive(Debug, Clone, Default)]
pub struct ManualTimers {
    now_ms: u64,
    next_id: u64,
    live: BTreeMap<TimerId, Interval>,
}

impl ManualTimers {
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn live_count(&self, kind: TimerKind) -> usize {
        self.live.values().filter(|i| i.kind == kind).count()
    }

    pub fn live_total(&self) -> usize {
        self.live.len()
    }

    /// Earliest interval due at or before `until_ms`; ties go to the older timer.
    pub(crate) fn next_due(&self, until_ms: u64) -> Option<(TimerId, Interval)> {
        self.live
            .iter()
            .filter(|(_, i)| i.due_ms <= until_ms)
            .min_by_key(|(id, i)| (i.due_ms, **id))
            .map(|(id, i)| (*id, *i))
    }
}

impl Timers for ManualTimers {
    fn start_interval(&mut self, kind: TimerKind, period_ms: u32) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let period_ms = u64::from(period_ms.max(1));
        self.live.insert(
            id,
            Interval {
                kind,
                period_ms,
                due_ms: self.now_ms + period_ms,
            },
        );
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.live.remove(&id);
    }
}

/// Run the virtual clock forward by `ms`, firing intervals in due order.
pub fn advance_time<S: Surface>(carousel: &mut Carousel<S, ManualTimers>, ms: u64) {
    let until_ms = carousel.timers().now_ms + ms;
    while let Some((id, interval)) = carousel.timers().next_due(until_ms) {
        let timers = carousel.timers_mut();
        timers.now_ms = interval.due_ms;
        if let Some(live) = timers.live.get_mut(&id) {
            live.due_ms += live.period_ms;
        }
        carousel.on_timer(interval.kind);
    }
    carousel.timers_mut().now_ms = until_ms;
}
