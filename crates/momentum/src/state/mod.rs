//! Engine state.
//!
//! [`Engine`] composes the pieces the renderer talks to:
//! - one shared [`IntervalCache`] of built series
//! - two independent charts (the selected direction and the aggregate),
//!   each with its own [`ViewportController`] and [`RefreshScheduler`]
//! - the collaborators: entity and comment access, a clock and the
//!   mutation hook
//!
//! Everything runs on one thread. A tick always rebuilds series through the
//! cache before any viewport reads them.

pub mod view;

pub use view::NavDirection;
pub use view::ViewWindow;
pub use view::ViewportController;
pub use view::ZoomState;

use std::sync::Arc;

use momentum_config::{Config, ViewportConfig};
use momentum_core::{
    breakdown, build_series, merge_all, EntityId, IntervalInfo, Period, Series, SourceContribution, AGGREGATE_ID,
};
use momentum_data::{comment_key, CommentSource, EntitySource, MutationHook, NoopHook};

use crate::cache::IntervalCache;
use crate::clock::Clock;
use crate::input::ViewportAction;
use crate::scheduler::RefreshScheduler;

/// The two charts on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartId {
    /// The single selected direction.
    Primary,
    /// The sum of all directions.
    Aggregate,
}

impl ChartId {
    /// The chart an entity is shown on.
    pub fn for_entity(entity_id: &str) -> Self {
        if entity_id == AGGREGATE_ID {
            ChartId::Aggregate
        } else {
            ChartId::Primary
        }
    }
}

/// Result of one refresh tick for one chart.
#[derive(Debug, Clone)]
pub struct Refresh {
    pub chart: ChartId,
    pub countdown: IntervalInfo,
    /// Whether a bucket rolled over and the window was rebuilt.
    pub recomputed: bool,
    /// The rebuilt window, only set when `recomputed` is true and the
    /// selection has data.
    pub window: Option<ViewWindow>,
}

#[derive(Debug, Clone)]
struct Selection {
    entity_id: EntityId,
    period: Period,
}

#[derive(Debug)]
struct Chart {
    viewport: ViewportController,
    scheduler: RefreshScheduler,
    selection: Option<Selection>,
}

impl Chart {
    fn new(viewport: &ViewportConfig, period: Period) -> Self {
        Self {
            viewport: ViewportController::new(viewport),
            scheduler: RefreshScheduler::new(period),
            selection: None,
        }
    }
}

/// Candle engine over an entity store.
pub struct Engine<S> {
    source: S,
    cache: IntervalCache,
    clock: Box<dyn Clock>,
    hook: Box<dyn MutationHook>,
    viewport_config: ViewportConfig,
    primary: Chart,
    aggregate: Chart,
}

impl<S> Engine<S>
where
    S: EntitySource + CommentSource,
{
    pub fn new(source: S, config: &Config, clock: impl Clock + 'static) -> Self {
        let period = config.general.period();
        Self {
            source,
            cache: IntervalCache::new(config.cache.max_entries),
            clock: Box::new(clock),
            hook: Box::new(NoopHook),
            viewport_config: config.viewport.clone(),
            primary: Chart::new(&config.viewport, period),
            aggregate: Chart::new(&config.viewport, period),
        }
    }

    /// Install the hook called after the visible count preference changes.
    pub fn with_hook(mut self, hook: impl MutationHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the store. Callers follow changes with
    /// [`data_changed`](Self::data_changed) or [`invalidate_all`](Self::invalidate_all).
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// The series for an entity, built or served from the cache.
    ///
    /// [`AGGREGATE_ID`] resolves to the merge of every live and soft-deleted
    /// entity.
    pub fn series(&mut self, entity_id: &str, period: Period) -> Option<Arc<Series>> {
        let now = self.clock.now_ms();
        let source = &self.source;
        self.cache.get_or_compute(entity_id, period, now, || {
            if entity_id == AGGREGATE_ID {
                let merged = merge_all(source.live_entities(), source.soft_deleted_entities())?;
                build_series(&merged, period, now)
            } else {
                build_series(source.live_entity(entity_id)?, period, now)
            }
        })
    }

    /// Select `(entity_id, period)` on its chart and return the window.
    pub fn get_view_window(&mut self, entity_id: &str, period: Period) -> Option<ViewWindow> {
        let chart = ChartId::for_entity(entity_id);
        self.select(chart, entity_id, period);
        self.view_window(chart)
    }

    /// Point a chart at another entity or period. A period change restarts
    /// the chart's refresh schedule.
    pub fn select(&mut self, chart: ChartId, entity_id: &str, period: Period) {
        let state = self.chart_mut(chart);
        let period_changed = state.selection.as_ref().map_or(true, |s| s.period != period);
        if period_changed {
            state.scheduler.reconfigure(period);
        }
        state.selection = Some(Selection {
            entity_id: entity_id.to_string(),
            period,
        });
    }

    pub fn selected_period(&self, chart: ChartId) -> Option<Period> {
        self.chart(chart).selection.as_ref().map(|s| s.period)
    }

    pub fn selected_entity(&self, chart: ChartId) -> Option<&str> {
        self.chart(chart).selection.as_ref().map(|s| s.entity_id.as_str())
    }

    /// Window of the chart's current selection, with annotation flags.
    pub fn view_window(&mut self, chart: ChartId) -> Option<ViewWindow> {
        let selection = self.chart(chart).selection.clone()?;
        let series = self.series(&selection.entity_id, selection.period)?;
        let mut window = self.chart(chart).viewport.window(&series)?;
        window.annotated = window
            .candles
            .iter()
            .map(|candle| {
                let key = comment_key(&selection.entity_id, selection.period, candle.display_at);
                self.source.comment(&key).is_some_and(|text| !text.trim().is_empty())
            })
            .collect();
        Some(window)
    }

    pub fn zoom(&self, chart: ChartId) -> &ZoomState {
        self.chart(chart).viewport.zoom()
    }

    pub fn zoom_in(&mut self, chart: ChartId) {
        self.with_series_viewport(chart, |vp, total| vp.zoom_in(total));
    }

    pub fn zoom_out(&mut self, chart: ChartId) {
        self.with_series_viewport(chart, |vp, total| vp.zoom_out(total));
    }

    pub fn reset_zoom(&mut self, chart: ChartId, count: usize) {
        self.update_viewport(chart, |vp| vp.reset_zoom(count));
    }

    pub fn set_visible_count(&mut self, chart: ChartId, count: usize) {
        let total = self.selected_len(chart).unwrap_or(0);
        self.update_viewport(chart, |vp| vp.set_visible_count(count, total));
    }

    pub fn pan(&mut self, chart: ChartId, delta_pixels: f64) {
        self.with_series_viewport(chart, |vp, total| vp.pan(delta_pixels, total));
    }

    pub fn navigate_left(&mut self, chart: ChartId, step: usize) {
        self.with_series_viewport(chart, |vp, total| vp.navigate(NavDirection::Left, step, total));
    }

    pub fn navigate_right(&mut self, chart: ChartId, step: usize) {
        self.with_series_viewport(chart, |vp, total| vp.navigate(NavDirection::Right, step, total));
    }

    pub fn navigate_to_end(&mut self, chart: ChartId) {
        self.update_viewport(chart, |vp| vp.navigate_to_end());
    }

    pub fn navigate_to_start(&mut self, chart: ChartId) {
        self.update_viewport(chart, |vp| vp.navigate_to_start());
    }

    /// Zoom with the candle under `fraction` of the visible range as anchor.
    pub fn zoom_at(&mut self, chart: ChartId, fraction: f64, zoom_in: bool) {
        self.with_series_viewport(chart, |vp, total| {
            vp.anchor_at(fraction, total);
            if zoom_in {
                vp.zoom_in(total);
            } else {
                vp.zoom_out(total);
            }
        });
    }

    pub fn apply(&mut self, chart: ChartId, action: ViewportAction) {
        let step = self.viewport_config.navigation_step;
        match action {
            ViewportAction::NavigateLeft => self.navigate_left(chart, step),
            ViewportAction::NavigateRight => self.navigate_right(chart, step),
            ViewportAction::NavigateToStart => self.navigate_to_start(chart),
            ViewportAction::NavigateToEnd => self.navigate_to_end(chart),
            ViewportAction::ZoomIn => self.zoom_in(chart),
            ViewportAction::ZoomOut => self.zoom_out(chart),
            ViewportAction::ResetZoom => self.reset_zoom(chart, self.viewport_config.default_visible_count),
            ViewportAction::Pan(dx) => self.pan(chart, dx),
            ViewportAction::ZoomAt { fraction, zoom_in } => self.zoom_at(chart, fraction, zoom_in),
        }
    }

    /// Poll both charts' schedulers.
    ///
    /// On a bucket rollover the series is rebuilt through the cache, a
    /// viewport pinned near the end is handed back to auto-follow and the
    /// window is recomputed. Otherwise only the countdown is reported.
    pub fn tick(&mut self) -> Vec<Refresh> {
        let now = self.clock.now_ms();
        let mut refreshes = Vec::with_capacity(2);
        for chart in [ChartId::Primary, ChartId::Aggregate] {
            if self.chart(chart).selection.is_none() {
                continue;
            }
            let outcome = self.chart_mut(chart).scheduler.tick(now);
            if !outcome.is_rollover() {
                refreshes.push(Refresh {
                    chart,
                    countdown: *outcome.info(),
                    recomputed: false,
                    window: None,
                });
                continue;
            }

            log::debug!("{:?} chart rolled over to bucket {}", chart, outcome.info().start);
            if let Some(total) = self.selected_len(chart) {
                self.chart_mut(chart).viewport.check_and_follow(total);
            }
            refreshes.push(Refresh {
                chart,
                countdown: *outcome.info(),
                recomputed: true,
                window: self.view_window(chart),
            });
        }
        refreshes
    }

    /// Drop every cached series, after bulk mutations such as an import.
    pub fn invalidate_all(&mut self) {
        self.cache.invalidate_all();
    }

    /// Drop the cached series of one entity and of the aggregate.
    pub fn invalidate_entity(&mut self, entity_id: &str) {
        self.cache.invalidate_entity(entity_id);
        self.cache.invalidate_entity(AGGREGATE_ID);
    }

    /// React to new data for `entity_id`: invalidate its series and let
    /// affected charts pinned near the end resume following.
    pub fn data_changed(&mut self, entity_id: &str) {
        self.invalidate_entity(entity_id);
        for chart in [ChartId::Primary, ChartId::Aggregate] {
            let affected = match self.selected_entity(chart) {
                Some(selected) => selected == entity_id || selected == AGGREGATE_ID,
                None => false,
            };
            if !affected {
                continue;
            }
            if let Some(total) = self.selected_len(chart) {
                self.chart_mut(chart).viewport.check_and_follow(total);
            }
        }
    }

    /// Per-direction contributions to one candle of the aggregate series.
    pub fn aggregate_breakdown(&mut self, period: Period, index: usize) -> Option<Vec<SourceContribution>> {
        let series = self.series(AGGREGATE_ID, period)?;
        let candle = series.get(index)?;
        let merged = merge_all(self.source.live_entities(), self.source.soft_deleted_entities())?;
        Some(breakdown(&merged, candle))
    }

    pub fn cached_series_count(&self) -> usize {
        self.cache.len()
    }

    fn chart(&self, chart: ChartId) -> &Chart {
        match chart {
            ChartId::Primary => &self.primary,
            ChartId::Aggregate => &self.aggregate,
        }
    }

    fn chart_mut(&mut self, chart: ChartId) -> &mut Chart {
        match chart {
            ChartId::Primary => &mut self.primary,
            ChartId::Aggregate => &mut self.aggregate,
        }
    }

    /// Candle count of the chart's selection, `None` without data.
    fn selected_len(&mut self, chart: ChartId) -> Option<usize> {
        let selection = self.chart(chart).selection.clone()?;
        let series = self.series(&selection.entity_id, selection.period)?;
        (!series.is_empty()).then_some(series.len())
    }

    /// Run a viewport operation that needs the series length. Without data
    /// the operation is skipped.
    fn with_series_viewport<F>(&mut self, chart: ChartId, op: F)
    where
        F: FnOnce(&mut ViewportController, usize),
    {
        let Some(total) = self.selected_len(chart) else {
            return;
        };
        self.update_viewport(chart, |vp| op(vp, total));
    }

    fn update_viewport<F>(&mut self, chart: ChartId, op: F)
    where
        F: FnOnce(&mut ViewportController),
    {
        let viewport = &mut self.chart_mut(chart).viewport;
        let before = viewport.zoom().visible_count;
        op(viewport);
        if viewport.zoom().visible_count != before {
            self.hook.on_mutated();
        }
    }
}
