//! src/scoring.rs
//!
//! The scoring engine: importance and urgency scores plus quadrant
//! assignment. Every function here is pure and reads nothing but its
//! arguments (and, for `urgency_score`, a single sample of the clock).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Urgency at or above this value counts as urgent.
pub const URGENCY_THRESHOLD: f64 = 0.5;
/// Importance score at or above this value counts as important.
pub const IMPORTANCE_THRESHOLD: f64 = 3.0;
/// Number of days before the deadline at which urgency starts to grow.
pub const DEFAULT_DAYS_WHEN_URGENT: f64 = 2.0;
/// Upper bound on the number of categories the importance formula accepts.
pub const MAX_CATEGORIES: usize = 6;

const HOURS_PER_WORKDAY: f64 = 8.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ScoringError {
    fn invalid<T: std::fmt::Display>(msg: T) -> Self {
        Self::InvalidInput(msg.to_string())
    }
}

/// One of the four Eisenhower buckets. Serialized as its number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Quadrant {
    /// Urgent and important.
    DoNow = 1,
    /// Important, not urgent.
    Schedule = 2,
    /// Urgent, not important.
    Delegate = 3,
    /// Neither.
    Eliminate = 4,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::DoNow,
        Quadrant::Schedule,
        Quadrant::Delegate,
        Quadrant::Eliminate,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Quadrant::DoNow => "do now",
            Quadrant::Schedule => "schedule",
            Quadrant::Delegate => "delegate",
            Quadrant::Eliminate => "eliminate",
        }
    }
}

impl From<Quadrant> for u8 {
    fn from(q: Quadrant) -> Self {
        q.number()
    }
}

impl TryFrom<u8> for Quadrant {
    type Error = ScoringError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Quadrant::DoNow),
            2 => Ok(Quadrant::Schedule),
            3 => Ok(Quadrant::Delegate),
            4 => Ok(Quadrant::Eliminate),
            other => Err(ScoringError::invalid(format!(
                "quadrant must be between 1 and 4, got {other}"
            ))),
        }
    }
}

/// The thresholds and urgency window currently in force.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub urgency_threshold: f64,
    pub importance_threshold: f64,
    pub urgent_boundary_days: f64,
}

impl ScoringPolicy {
    pub fn with_urgent_boundary(days_when_urgent: f64) -> Self {
        Self {
            urgent_boundary_days: days_when_urgent,
            ..Self::default()
        }
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            urgency_threshold: URGENCY_THRESHOLD,
            importance_threshold: IMPORTANCE_THRESHOLD,
            urgent_boundary_days: DEFAULT_DAYS_WHEN_URGENT,
        }
    }
}

/// Blend an absolute importance rating (1-5) with how far the task's
/// category weight sits above the equal-weight baseline.
///
/// Returns a value in `[1, 5]`.
pub fn importance_score(
    importance: u8,
    category_coefficient: f64,
    num_categories_created: usize,
) -> Result<f64, ScoringError> {
    if !(1..=5).contains(&importance) {
        return Err(ScoringError::invalid(format!(
            "importance must be between 1 and 5, got {importance}"
        )));
    }
    if !(1..=MAX_CATEGORIES).contains(&num_categories_created) {
        return Err(ScoringError::invalid(format!(
            "number of categories must be between 1 and {MAX_CATEGORIES}, got {num_categories_created}"
        )));
    }
    // Written this way so NaN fails too.
    if !(category_coefficient > 0.0 && category_coefficient <= 1.0) {
        return Err(ScoringError::invalid(format!(
            "category coefficient must be in (0, 1], got {category_coefficient}"
        )));
    }

    let normalized = f64::from(importance - 1) / 4.0;

    let k = if num_categories_created == 1 {
        1.0
    } else {
        let avg = 1.0 / num_categories_created as f64;
        ((category_coefficient - avg) / (1.0 - avg)).clamp(0.0, 1.0)
    };

    let combined = 0.7 * normalized + 0.3 * k;
    Ok(1.0 + combined * 4.0)
}

/// Urgency of a task relative to the current time.
///
/// Samples the clock once and delegates to [`urgency_score_at`].
pub fn urgency_score(
    due_date: Option<DateTime<Utc>>,
    effort_hours: f64,
    days_when_urgent: f64,
) -> Result<f64, ScoringError> {
    urgency_score_at(Utc::now(), due_date, effort_hours, days_when_urgent)
}

/// Urgency of a task as seen from `now`.
///
/// No due date means no urgency. Overdue tasks are maximally urgent.
/// Otherwise time pressure decays quadratically to zero at
/// `days_when_urgent` days out and is blended 70/30 with effort measured
/// against an 8-hour workday.
pub fn urgency_score_at(
    now: DateTime<Utc>,
    due_date: Option<DateTime<Utc>>,
    effort_hours: f64,
    days_when_urgent: f64,
) -> Result<f64, ScoringError> {
    let Some(due_date) = due_date else {
        return Ok(0.0);
    };

    if !(effort_hours > 0.0) {
        return Err(ScoringError::invalid(format!(
            "effort hours must be positive, got {effort_hours}"
        )));
    }
    if !(days_when_urgent > 0.0) {
        return Err(ScoringError::invalid(format!(
            "days when urgent must be positive, got {days_when_urgent}"
        )));
    }

    let delta_days = (due_date - now).num_milliseconds() as f64 / MILLIS_PER_DAY;
    if delta_days <= 0.0 {
        return Ok(1.0);
    }

    let time_ratio = delta_days / days_when_urgent;
    let time_coeff = (1.0 - time_ratio * time_ratio).clamp(0.0, 1.0);
    let effort_coeff = (effort_hours / HOURS_PER_WORKDAY).clamp(0.0, 1.0);

    Ok(0.7 * time_coeff + 0.3 * effort_coeff)
}

/// Bucket a task by its two scores. Both thresholds are inclusive.
pub fn assign_quadrant(urgency_score: f64, importance_score: f64) -> Quadrant {
    let urgent = urgency_score >= URGENCY_THRESHOLD;
    let important = importance_score >= IMPORTANCE_THRESHOLD;

    match (urgent, important) {
        (true, true) => Quadrant::DoNow,
        (false, true) => Quadrant::Schedule,
        (true, false) => Quadrant::Delegate,
        (false, false) => Quadrant::Eliminate,
    }
}
