//! Viewport state: which slice of a series a chart shows.
//!
//! A [`ViewportController`] owns one [`ZoomState`]. `center_index = None`
//! means the chart follows the newest candle; `Some(i)` pins it to candle
//! `i`. Every operation takes the current series length because the
//! series can grow between calls while the zoom state stays put.

use momentum_config::ViewportConfig;
use momentum_core::{Candle, Series};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomState {
    pub visible_count: usize,
    /// `None` = auto-follow the newest candle.
    pub center_index: Option<usize>,
    pub min_count: usize,
    pub max_count: usize,
}

impl ZoomState {
    pub fn from_config(config: &ViewportConfig) -> Self {
        let min_count = config.min_count.max(1);
        let max_count = config.max_count.max(min_count);
        Self {
            visible_count: config.default_visible_count.clamp(min_count, max_count),
            center_index: None,
            min_count,
            max_count,
        }
    }

    pub fn half_visible(&self) -> usize {
        self.visible_count / 2
    }

    pub fn is_following(&self) -> bool {
        self.center_index.is_none()
    }

    fn clamp_count(&self, count: usize) -> usize {
        count.clamp(self.min_count, self.max_count)
    }

    /// Keep a center inside `[half, total - 1 - half]`. The lower bound wins
    /// when the series is narrower than the window.
    fn clamp_center(&self, center: usize, total: usize) -> usize {
        let half = self.half_visible();
        let upper = total.saturating_sub(1).saturating_sub(half);
        center.min(upper).max(half)
    }
}

/// The bounded slice of a series handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewWindow {
    pub candles: Vec<Candle>,
    pub start_index: usize,
    pub end_index: usize,
    pub total_candles: usize,
    pub visible_count: usize,
    /// Parallel to `candles`: whether a comment exists for the candle.
    pub annotated: Vec<bool>,
}

impl ViewWindow {
    pub fn shows_everything(&self) -> bool {
        self.start_index == 0 && self.visible_count == self.total_candles
    }

    /// Position text such as `"candles 3-52 of 120 • zoom 50"`, only when
    /// part of the series is hidden.
    pub fn position_label(&self) -> Option<String> {
        if self.shows_everything() {
            return None;
        }
        Some(format!(
            "candles {}-{} of {} • zoom {}",
            self.start_index + 1,
            self.end_index + 1,
            self.total_candles,
            self.visible_count
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    /// Towards older candles.
    Left,
    /// Towards newer candles.
    Right,
}

/// Zoom/pan state machine for one chart.
#[derive(Debug, Clone)]
pub struct ViewportController {
    zoom: ZoomState,
    config: ViewportConfig,
}

impl ViewportController {
    pub fn new(config: &ViewportConfig) -> Self {
        Self {
            zoom: ZoomState::from_config(config),
            config: config.clone(),
        }
    }

    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    /// Slice `series` according to the zoom state.
    ///
    /// Returns `None` for an empty series. A pinned center past the end of
    /// the series is treated as the last candle. The render cap is applied
    /// last and keeps the newest candles of the window.
    pub fn window(&self, series: &Series) -> Option<ViewWindow> {
        let total = series.len();
        if total == 0 {
            return None;
        }
        let visible = self.zoom.visible_count.min(total).max(1);
        let last = total - 1;

        let (mut start, end) = match self.zoom.center_index {
            None => (total - visible, last),
            Some(center) => {
                let center = center.min(last);
                let mut start = center.saturating_sub(visible / 2);
                let end = (start + visible - 1).min(last);
                if end - start + 1 < visible && start > 0 {
                    start = (end + 1).saturating_sub(visible);
                }
                (start, end)
            }
        };

        let cap = self.config.render_cap.max(1);
        if end - start + 1 > cap {
            start = end + 1 - cap;
        }

        let candles = series.candles[start..=end].to_vec();
        let visible_count = candles.len();
        Some(ViewWindow {
            annotated: vec![false; visible_count],
            candles,
            start_index: start,
            end_index: end,
            total_candles: total,
            visible_count,
        })
    }

    pub fn zoom_in(&mut self, total: usize) {
        self.rescale(self.config.zoom_in_factor, total);
    }

    pub fn zoom_out(&mut self, total: usize) {
        self.rescale(self.config.zoom_out_factor, total);
    }

    /// Scale the visible count around the current center. An auto-following
    /// viewport is pinned first so the zoom stays on what is on screen.
    fn rescale(&mut self, factor: f64, total: usize) {
        let center = self
            .zoom
            .center_index
            .unwrap_or_else(|| total.saturating_sub(self.zoom.half_visible()));
        let scaled = (self.zoom.visible_count as f64 * factor).floor() as usize;
        self.zoom.visible_count = self.zoom.clamp_count(scaled);
        self.zoom.center_index = Some(self.zoom.clamp_center(center, total));
    }

    /// Back to auto-follow with `count` visible candles.
    pub fn reset_zoom(&mut self, count: usize) {
        self.zoom.visible_count = self.zoom.clamp_count(count);
        self.zoom.center_index = None;
    }

    pub fn set_visible_count(&mut self, count: usize, total: usize) {
        self.zoom.visible_count = self.zoom.clamp_count(count);
        if let Some(center) = self.zoom.center_index {
            self.zoom.center_index = Some(self.zoom.clamp_center(center, total));
        }
    }

    /// Drag by `delta_pixels`. Dragging right (positive) reveals older
    /// candles. One pixel covers more candles the further out the zoom is.
    pub fn pan(&mut self, delta_pixels: f64, total: usize) {
        let per_pixel = (self.zoom.visible_count as f64 / self.config.pan_pixel_span)
            .max(self.config.min_candles_per_pixel);
        let bound = total as f64;
        let delta = (delta_pixels * per_pixel + 0.5).floor().clamp(-bound, bound) as i64;

        let center = self.pinned_center(total) as i64;
        let moved = (center - delta).max(0) as usize;
        self.zoom.center_index = Some(self.zoom.clamp_center(moved, total));
    }

    /// Shift the center by `step` candles.
    pub fn navigate(&mut self, direction: NavDirection, step: usize, total: usize) {
        let center = self.pinned_center(total);
        let moved = match direction {
            NavDirection::Left => center.saturating_sub(step),
            NavDirection::Right => center.saturating_add(step),
        };
        self.zoom.center_index = Some(self.zoom.clamp_center(moved, total));
    }

    pub fn navigate_to_end(&mut self) {
        self.zoom.center_index = None;
    }

    /// Pin to the oldest center that still fills the window.
    pub fn navigate_to_start(&mut self) {
        self.zoom.center_index = Some(self.zoom.half_visible());
    }

    /// Re-center on the candle under `fraction` (0 = left edge, 1 = right
    /// edge) of the visible range, ahead of a cursor-anchored zoom.
    pub fn anchor_at(&mut self, fraction: f64, total: usize) {
        if total == 0 {
            return;
        }
        let center = self
            .zoom
            .center_index
            .unwrap_or_else(|| total.saturating_sub(self.zoom.half_visible()));
        let start = center.saturating_sub(self.zoom.half_visible());
        let end = (start + self.zoom.visible_count).saturating_sub(1).min(total - 1).max(start);
        let target = start + ((end - start) as f64 * fraction.clamp(0.0, 1.0)).floor() as usize;
        self.zoom.center_index = Some(self.zoom.clamp_center(target, total));
    }

    /// Hand a viewport pinned near the newest candle back to auto-follow.
    ///
    /// Returns true if the viewport switched to following.
    pub fn check_and_follow(&mut self, total: usize) -> bool {
        let Some(center) = self.zoom.center_index else {
            return false;
        };
        let distance_from_end = total.saturating_sub(1).saturating_sub(center);
        if distance_from_end <= self.zoom.half_visible() {
            self.zoom.center_index = None;
            return true;
        }
        false
    }

    fn pinned_center(&self, total: usize) -> usize {
        self.zoom.center_index.unwrap_or_else(|| total.saturating_sub(1))
    }
}
