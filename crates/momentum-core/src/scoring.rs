//! Session scoring: turns a work session's focus, duration and outcome into
//! a single score delta.

use serde::{Deserialize, Serialize};

/// Per-direction limits for session scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringRules {
    pub focus_max_points: f64,
    pub time_max_minutes: f64,
    pub time_max_points: f64,
    pub result_max_points: f64,
    /// Optional cap on the total. Negative caps are ignored.
    pub total_max_points: Option<f64>,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            focus_max_points: 10.0,
            time_max_minutes: 60.0,
            time_max_points: 6.0,
            result_max_points: 5.0,
            total_max_points: None,
        }
    }
}

/// What the user reports about a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInputs {
    /// -100..=100
    pub focus_percent: f64,
    pub minutes: f64,
    /// -100..=100
    pub result_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionPoints {
    pub focus: f64,
    pub time: f64,
    pub result: f64,
    pub total: f64,
}

/// Score a session. Focus and result may be negative, time never is.
pub fn calculate_session_points(rules: &ScoringRules, inputs: &SessionInputs) -> SessionPoints {
    let focus_ratio = (inputs.focus_percent / 100.0).clamp(-1.0, 1.0);
    let result_ratio = (inputs.result_percent / 100.0).clamp(-1.0, 1.0);
    let time_ratio = if rules.time_max_minutes > 0.0 {
        (inputs.minutes / rules.time_max_minutes).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let focus = focus_ratio * rules.focus_max_points;
    let time = time_ratio * rules.time_max_points;
    let result = result_ratio * rules.result_max_points;

    let mut total = focus + time + result;
    if let Some(cap) = rules.total_max_points.filter(|c| *c >= 0.0) {
        total = total.min(cap);
    }
    if !total.is_finite() {
        total = 0.0;
    }

    SessionPoints {
        focus,
        time,
        result,
        total,
    }
}
