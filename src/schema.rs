//! src/schema.rs
//!
//! Request and response bodies of the HTTP API, together with the
//! explicit checks each request must pass before it reaches storage or
//! the scoring engine.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::Task,
    scoring::{MAX_CATEGORIES, ScoringPolicy},
};

/// How far a bulk category setup may stray from a total weight of 1.0.
pub const COEFFICIENT_SUM_TOLERANCE: f64 = 0.01;

//=============================================================================
//  Timestamps
//=============================================================================

/// Parse a client-supplied timestamp into UTC.
///
/// Offsets are honoured. Timestamps without one, including bare dates,
/// are taken to be UTC already.
pub fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
        return Ok(aware.with_timezone(&Utc));
    }
    // RFC 3339 insists on seconds
    if let Ok(aware) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
        return Ok(aware.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(AppError::parse(format!("unrecognised timestamp: {raw}")))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|s| parse_timestamp(&s).map_err(serde::de::Error::custom))
        .transpose()
}

//=============================================================================
//  Category API
//=============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub coefficient: f64,
}

impl NewCategory {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("category name must not be empty"));
        }
        if !(self.coefficient > 0.0 && self.coefficient <= 1.0) {
            return Err(AppError::validation(format!(
                "coefficient must be in (0, 1], got {}",
                self.coefficient
            )));
        }
        Ok(())
    }
}

/// Body of `POST /api/categories/bulk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySetupRequest {
    pub categories: Vec<NewCategory>,
}

impl CategorySetupRequest {
    pub fn validate(&self) -> AppResult<()> {
        let count = self.categories.len();
        if count == 0 || count > MAX_CATEGORIES {
            return Err(AppError::validation(format!(
                "between 1 and {MAX_CATEGORIES} categories required, got {count}"
            )));
        }
        for category in &self.categories {
            category.validate()?;
        }
        for (i, category) in self.categories.iter().enumerate() {
            if self.categories[..i].iter().any(|c| c.name == category.name) {
                return Err(AppError::validation(format!(
                    "category '{}' listed twice",
                    category.name
                )));
            }
        }
        let total: f64 = self.categories.iter().map(|c| c.coefficient).sum();
        if (total - 1.0).abs() > COEFFICIENT_SUM_TOLERANCE {
            return Err(AppError::validation(format!(
                "coefficients must sum to 1.0, got {total}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupStatusResponse {
    pub setup_complete: bool,
    pub category_count: usize,
}

/// The policy the scores are computed under, plus the live category weights.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringPolicyResponse {
    #[serde(flatten)]
    pub policy: ScoringPolicy,
    pub category_weights: BTreeMap<u64, f64>,
}

//=============================================================================
//  Task API
//=============================================================================

/// Body of `POST /api/tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub description: String,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_effort_hours: f64,
    pub importance: u8,
    pub category_id: u64,
}

impl NewTask {
    pub fn validate(&self) -> AppResult<()> {
        if self.description.trim().is_empty() {
            return Err(AppError::validation("description must not be empty"));
        }
        if !(self.estimated_effort_hours > 0.0 && self.estimated_effort_hours.is_finite()) {
            return Err(AppError::validation(format!(
                "estimated_effort_hours must be positive, got {}",
                self.estimated_effort_hours
            )));
        }
        if !(1..=5).contains(&self.importance) {
            return Err(AppError::validation(format!(
                "importance must be between 1 and 5, got {}",
                self.importance
            )));
        }
        Ok(())
    }
}

/// Open tasks grouped by quadrant number, keyed "1" through "4".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksByQuadrant {
    pub quadrants: IndexMap<String, Vec<Task>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescoreResponse {
    /// Open tasks that were looked at.
    pub rescored: usize,
    /// Of those, how many had a score move.
    pub changed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn category(name: &str, coefficient: f64) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            coefficient,
        }
    }

    #[test]
    fn test_parse_timestamp_aware_is_converted() {
        let parsed = parse_timestamp("2025-06-01T12:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap());
        let zulu = parse_timestamp("2025-06-01T12:00:00Z").unwrap();
        assert_eq!(zulu, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
        let minutes = parse_timestamp("2025-06-01T12:00+02:00").unwrap();
        assert_eq!(minutes, parsed);
    }

    #[test]
    fn test_parse_timestamp_naive_is_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-06-01T12:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-06-01 12:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-06-01T12:30").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2025-06-01").unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
        );
        assert!(matches!(parse_timestamp("next tuesday"), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_new_task_due_date_forms() {
        let body = r#"{"description":"a","estimated_effort_hours":1.0,"importance":3,"category_id":1}"#;
        let task: NewTask = serde_json::from_str(body).unwrap();
        assert!(task.due_date.is_none());
        assert!(!task.is_done);

        let body = r#"{"description":"a","due_date":null,"estimated_effort_hours":1.0,"importance":3,"category_id":1}"#;
        assert!(serde_json::from_str::<NewTask>(body).unwrap().due_date.is_none());

        let body = r#"{"description":"a","due_date":"2025-06-01T08:00:00","estimated_effort_hours":1.0,"importance":3,"category_id":1}"#;
        let task: NewTask = serde_json::from_str(body).unwrap();
        assert_eq!(task.due_date, Some(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()));

        let body = r#"{"description":"a","due_date":"soon","estimated_effort_hours":1.0,"importance":3,"category_id":1}"#;
        assert!(serde_json::from_str::<NewTask>(body).is_err());
    }

    #[test]
    fn test_new_task_validation() {
        let mut task = NewTask {
            description: "plan sprint".into(),
            is_done: false,
            due_date: None,
            estimated_effort_hours: 2.0,
            importance: 3,
            category_id: 1,
        };
        assert!(task.validate().is_ok());

        task.importance = 6;
        assert!(task.validate().is_err());
        task.importance = 3;

        task.estimated_effort_hours = 0.0;
        assert!(task.validate().is_err());
        task.estimated_effort_hours = f64::INFINITY;
        assert!(task.validate().is_err());
        task.estimated_effort_hours = 2.0;

        task.description = "   ".into();
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_category_setup_validation() {
        let ok = CategorySetupRequest {
            categories: vec![category("work", 0.5), category("home", 0.3), category("health", 0.2)],
        };
        assert!(ok.validate().is_ok());

        let close_enough = CategorySetupRequest {
            categories: vec![category("work", 0.505), category("home", 0.5)],
        };
        assert!(close_enough.validate().is_ok());

        let bad_sum = CategorySetupRequest {
            categories: vec![category("work", 0.5), category("home", 0.3)],
        };
        assert!(bad_sum.validate().is_err());

        let empty = CategorySetupRequest { categories: vec![] };
        assert!(empty.validate().is_err());

        let too_many = CategorySetupRequest {
            categories: (0..7).map(|i| category(&format!("c{i}"), 1.0 / 7.0)).collect(),
        };
        assert!(too_many.validate().is_err());

        let duplicate = CategorySetupRequest {
            categories: vec![category("work", 0.5), category("work", 0.5)],
        };
        assert!(duplicate.validate().is_err());

        let zero = CategorySetupRequest {
            categories: vec![category("work", 1.0), category("home", 0.0)],
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_policy_response_is_flat() {
        let response = ScoringPolicyResponse {
            policy: ScoringPolicy::default(),
            category_weights: BTreeMap::from([(1, 0.6), (2, 0.4)]),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["importance_threshold"], 3.0);
        assert_eq!(value["urgent_boundary_days"], 2.0);
        assert_eq!(value["category_weights"]["2"], 0.4);
    }
}
