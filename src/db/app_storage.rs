use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use log::warn;

use crate::{
    db::{categories::CategoryStorage, tasks::TaskStorage},
    error::{AppError, AppResult},
    models::{Category, Task, TaskScores},
    schema::{NewCategory, NewTask},
    scoring::MAX_CATEGORIES,
};

/// Outcome of a rescoring pass over open tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescoreSummary {
    pub rescored: usize,
    pub changed: usize,
}

// Composite storage for categories and tasks
#[derive(Clone)]
pub struct AppStorage {
    pub categories: Arc<CategoryStorage>,
    pub tasks: Arc<TaskStorage>,
    // Held across check-then-write sequences that span both stores
    write_lock: Arc<Mutex<()>>,
}

impl AppStorage {
    /// Takes a base path and opens "/categories" and "/tasks" beneath it
    pub fn new<P: AsRef<Path>>(base_path: P) -> anyhow::Result<Self> {
        let base_path = base_path.as_ref();
        std::fs::create_dir_all(base_path)?;

        let categories = Arc::new(CategoryStorage::open(base_path.join("categories"))?);
        let tasks = Arc::new(TaskStorage::open(base_path.join("tasks"))?);

        Ok(Self {
            categories,
            tasks,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| AppError::Internal(anyhow!("storage write lock poisoned")))
    }

    /// (categories, tasks)
    pub fn get_stats(&self) -> (usize, usize) {
        (self.categories.count(), self.tasks.count())
    }
}

// Categories
impl AppStorage {
    pub fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(self.categories.list_all()?)
    }

    pub fn create_category(&self, request: NewCategory) -> AppResult<Category> {
        let mut created = self.create_categories(vec![request])?;
        created
            .pop()
            .ok_or_else(|| AppError::Internal(anyhow!("category batch came back empty")))
    }

    /// All-or-nothing: either every category is stored or none is.
    pub fn create_categories(&self, requests: Vec<NewCategory>) -> AppResult<Vec<Category>> {
        let _guard = self.lock()?;

        for (i, request) in requests.iter().enumerate() {
            if requests[..i].iter().any(|r| r.name == request.name)
                || self.categories.find_by_name(&request.name)?.is_some()
            {
                return Err(AppError::bad_request(format!(
                    "Category '{}' already exists",
                    request.name
                )));
            }
        }

        let total = self.categories.count() + requests.len();
        if total > MAX_CATEGORIES {
            return Err(AppError::conflict(format!(
                "at most {MAX_CATEGORIES} categories may exist, this would make {total}"
            )));
        }

        let mut categories: Vec<Category> = requests.into_iter().map(Category::from).collect();
        self.categories.insert_many(&mut categories)?;
        Ok(categories)
    }

    pub fn delete_category(&self, id: u64) -> AppResult<Category> {
        let _guard = self.lock()?;

        if self.categories.get(id)?.is_none() {
            return Err(AppError::not_found(format!("Category with id {id} not found")));
        }
        if self.tasks.any_in_category(id)? {
            return Err(AppError::conflict(format!(
                "Category with id {id} still has tasks"
            )));
        }
        self.categories
            .delete(id)?
            .ok_or_else(|| AppError::not_found(format!("Category with id {id} not found")))
    }
}

// Tasks
impl AppStorage {
    pub fn list_tasks(&self) -> AppResult<Vec<Task>> {
        Ok(self.tasks.list_all()?)
    }

    pub fn list_open_tasks(&self) -> AppResult<Vec<Task>> {
        Ok(self.tasks.list_open()?)
    }

    /// Score and store a new task under an existing category.
    pub fn create_task(
        &self,
        request: NewTask,
        now: DateTime<Utc>,
        days_when_urgent: f64,
    ) -> AppResult<Task> {
        let _guard = self.lock()?;

        let category = self.categories.get(request.category_id)?.ok_or_else(|| {
            AppError::not_found(format!(
                "Category with id {} not found",
                request.category_id
            ))
        })?;
        let num_categories_created = self.categories.count();

        let scores = TaskScores::compute(
            now,
            request.importance,
            request.due_date,
            request.estimated_effort_hours,
            &category,
            num_categories_created,
            days_when_urgent,
        )?;

        let mut task = Task::new(request, scores, now);
        self.tasks.insert(&mut task)?;
        Ok(task)
    }

    pub fn toggle_task_done(&self, id: u64) -> AppResult<Task> {
        let _guard = self.lock()?;

        let mut task = self
            .tasks
            .get(id)?
            .ok_or_else(|| AppError::not_found(format!("Task with id {id} not found")))?;
        task.toggle_done();
        if !self.tasks.update(&task)? {
            return Err(AppError::not_found(format!("Task with id {id} not found")));
        }
        self.tasks.flush()?;
        Ok(task)
    }

    pub fn delete_task(&self, id: u64) -> AppResult<Task> {
        let _guard = self.lock()?;

        self.tasks
            .delete(id)?
            .ok_or_else(|| AppError::not_found(format!("Task with id {id} not found")))
    }

    /// Recompute the scores of every open task as seen from `now`.
    ///
    /// Urgency drifts with the clock and importance shifts whenever the
    /// category set changes, so stored scores go stale on their own.
    pub fn rescore_open_tasks(
        &self,
        now: DateTime<Utc>,
        days_when_urgent: f64,
    ) -> AppResult<RescoreSummary> {
        let _guard = self.lock()?;

        let categories: HashMap<u64, Category> = self
            .categories
            .list_all()?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let num_categories_created = categories.len();

        let mut summary = RescoreSummary::default();
        for mut task in self.tasks.list_open()? {
            let Some(category) = categories.get(&task.category_id) else {
                warn!(
                    "Task {} references missing category {}, skipping",
                    task.id, task.category_id
                );
                continue;
            };
            summary.rescored += 1;
            if task.rescore(now, category, num_categories_created, days_when_urgent)?
                && self.tasks.update(&task)?
            {
                summary.changed += 1;
            }
        }
        if summary.changed > 0 {
            self.tasks.flush()?;
        }

        Ok(summary)
    }
}
