use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    scoring::{self, Quadrant, ScoringError},
    schema::{NewCategory, NewTask},
};

/// A weighted bucket tasks are filed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    /// Relative weight in (0, 1]. Weights across categories should sum to 1.
    pub coefficient: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NewCategory> for Category {
    fn from(request: NewCategory) -> Self {
        let now = Utc::now();

        Category {
            id: 0, // assigned by storage
            name: request.name,
            coefficient: request.coefficient,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The scores the engine produced for a task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskScores {
    pub urgency_score: f64,
    pub imp_score: f64,
    pub quadrant: Quadrant,
}

impl TaskScores {
    /// Run the three engine operations for one task as seen from `now`.
    pub fn compute(
        now: DateTime<Utc>,
        importance: u8,
        due_date: Option<DateTime<Utc>>,
        estimated_effort_hours: f64,
        category: &Category,
        num_categories_created: usize,
        days_when_urgent: f64,
    ) -> Result<Self, ScoringError> {
        let imp_score =
            scoring::importance_score(importance, category.coefficient, num_categories_created)?;
        let urgency_score = scoring::urgency_score_at(
            now,
            due_date,
            estimated_effort_hours,
            days_when_urgent,
        )?;
        Ok(Self {
            urgency_score,
            imp_score,
            quadrant: scoring::assign_quadrant(urgency_score, imp_score),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub description: String,
    pub is_done: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_effort_hours: f64,
    /// Raw 1-5 rating supplied by the client.
    pub importance: u8,
    pub category_id: u64,
    pub urgency_score: f64,
    pub imp_score: f64,
    pub quadrant: Quadrant,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(request: NewTask, scores: TaskScores, now: DateTime<Utc>) -> Self {
        Task {
            id: 0, // assigned by storage
            description: request.description,
            is_done: request.is_done,
            due_date: request.due_date,
            estimated_effort_hours: request.estimated_effort_hours,
            importance: request.importance,
            category_id: request.category_id,
            urgency_score: scores.urgency_score,
            imp_score: scores.imp_score,
            quadrant: scores.quadrant,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recompute scores against the current category set.
    ///
    /// Returns whether any score moved. `updated_at` is left alone since
    /// rescoring is not a user edit.
    pub fn rescore(
        &mut self,
        now: DateTime<Utc>,
        category: &Category,
        num_categories_created: usize,
        days_when_urgent: f64,
    ) -> Result<bool, ScoringError> {
        let scores = TaskScores::compute(
            now,
            self.importance,
            self.due_date,
            self.estimated_effort_hours,
            category,
            num_categories_created,
            days_when_urgent,
        )?;
        let changed = scores.urgency_score != self.urgency_score
            || scores.imp_score != self.imp_score
            || scores.quadrant != self.quadrant;
        self.urgency_score = scores.urgency_score;
        self.imp_score = scores.imp_score;
        self.quadrant = scores.quadrant;
        Ok(changed)
    }

    pub fn toggle_done(&mut self) {
        self.is_done = !self.is_done;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn category(coefficient: f64) -> Category {
        let now = Utc::now();
        Category {
            id: 1,
            name: "work".into(),
            coefficient,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(due_date: Option<DateTime<Utc>>) -> NewTask {
        NewTask {
            description: "write report".into(),
            is_done: false,
            due_date,
            estimated_effort_hours: 8.0,
            importance: 5,
            category_id: 1,
        }
    }

    #[test]
    fn test_compute_scores_for_urgent_important_task() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let scores = TaskScores::compute(
            now,
            5,
            Some(now + Duration::days(1)),
            8.0,
            &category(1.0),
            1,
            2.0,
        )
        .unwrap();
        assert!((scores.imp_score - 5.0).abs() < 1e-9);
        assert!((scores.urgency_score - 0.825).abs() < 1e-9);
        assert_eq!(scores.quadrant, Quadrant::DoNow);
    }

    #[test]
    fn test_rescore_tracks_passing_time() {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let due = created + Duration::days(3);
        let cat = category(1.0);
        let scores = TaskScores::compute(created, 5, Some(due), 8.0, &cat, 1, 2.0).unwrap();
        let mut task = Task::new(request(Some(due)), scores, created);
        assert_eq!(task.quadrant, Quadrant::Schedule);

        let later = created + Duration::days(3) + Duration::hours(1);
        assert!(task.rescore(later, &cat, 1, 2.0).unwrap());
        assert_eq!(task.urgency_score, 1.0);
        assert_eq!(task.quadrant, Quadrant::DoNow);
        assert_eq!(task.updated_at, created);

        assert!(!task.rescore(later, &cat, 1, 2.0).unwrap());
    }

    #[test]
    fn test_toggle_done_flips_and_touches() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let scores = TaskScores::compute(now, 5, None, 8.0, &category(1.0), 1, 2.0).unwrap();
        let mut task = Task::new(request(None), scores, now);
        task.toggle_done();
        assert!(task.is_done);
        assert!(task.updated_at > now);
        task.toggle_done();
        assert!(!task.is_done);
    }
}
