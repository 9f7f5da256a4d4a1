//! Input handling for momentum charts.
//!
//! Converts raw input (key names, wheel and drag deltas) into semantic
//! [`ViewportAction`]s that the [`Engine`](crate::Engine) applies to one chart.

/// Semantic viewport operations triggered by user input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportAction {
    /// Step towards older candles.
    NavigateLeft,
    /// Step towards newer candles.
    NavigateRight,
    /// Jump to the oldest candles.
    NavigateToStart,
    /// Jump back to the newest candles and follow them.
    NavigateToEnd,
    ZoomIn,
    ZoomOut,
    /// Restore the configured default zoom.
    ResetZoom,
    /// Drag by the given horizontal delta in pixels.
    Pan(f64),
    /// Zoom around the cursor.
    ZoomAt {
        /// Cursor position across the visible range, 0 = left edge.
        fraction: f64,
        zoom_in: bool,
    },
}

/// Map a key name (`KeyboardEvent.key` style) to an action.
///
/// `+`/`=` zoom in, `-` zooms out, `0` resets, arrows navigate and
/// `Home`/`End` jump to the edges.
pub fn action_for_key(key: &str) -> Option<ViewportAction> {
    match key {
        "ArrowLeft" => Some(ViewportAction::NavigateLeft),
        "ArrowRight" => Some(ViewportAction::NavigateRight),
        "Home" => Some(ViewportAction::NavigateToStart),
        "End" => Some(ViewportAction::NavigateToEnd),
        "+" | "=" => Some(ViewportAction::ZoomIn),
        "-" => Some(ViewportAction::ZoomOut),
        "0" => Some(ViewportAction::ResetZoom),
        _ => None,
    }
}

/// Map a wheel event to a cursor-anchored zoom. Scrolling up zooms in.
pub fn action_for_wheel(delta_y: f64, cursor_fraction: f64) -> Option<ViewportAction> {
    if delta_y == 0.0 || !delta_y.is_finite() {
        return None;
    }
    Some(ViewportAction::ZoomAt {
        fraction: cursor_fraction.clamp(0.0, 1.0),
        zoom_in: delta_y < 0.0,
    })
}
