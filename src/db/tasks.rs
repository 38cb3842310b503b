use std::path::Path;

use sled::Db;

use crate::{error::AppResult, models::Task};

pub struct TaskStorage {
    db: Db,
    tasks: sled::Tree,
}

impl TaskStorage {
    /// Open or create a new task storage in the given path
    pub fn open<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let db = sled::open(path)?;
        let tasks = db.open_tree("tasks")?;

        Ok(Self { db, tasks })
    }

    /// Big-endian so iteration follows id order
    fn make_key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    /// Store a new task, assigning it the next id
    pub fn insert(&self, task: &mut Task) -> AppResult<()> {
        task.id = self.db.generate_id()? + 1;
        let bytes = rmp_serde::to_vec_named(&*task)?;
        self.tasks.insert(Self::make_key(task.id), bytes)?;
        self.tasks.flush()?;
        Ok(())
    }

    pub fn get(&self, id: u64) -> AppResult<Option<Task>> {
        if let Some(value) = self.tasks.get(Self::make_key(id))? {
            Ok(Some(rmp_serde::from_slice(&value)?))
        } else {
            Ok(None)
        }
    }

    /// Overwrite a stored task. Returns false, writing nothing, when the
    /// task is no longer there.
    pub fn update(&self, task: &Task) -> AppResult<bool> {
        let bytes = rmp_serde::to_vec_named(task)?;
        let previous = self
            .tasks
            .fetch_and_update(Self::make_key(task.id), |old| old.map(|_| bytes.clone()))?;
        Ok(previous.is_some())
    }

    /// Remove a task, returning it if it existed
    pub fn delete(&self, id: u64) -> AppResult<Option<Task>> {
        let removed = match self.tasks.remove(Self::make_key(id))? {
            Some(value) => Some(rmp_serde::from_slice(&value)?),
            None => None,
        };
        self.tasks.flush()?;
        Ok(removed)
    }

    pub fn list_all(&self) -> AppResult<Vec<Task>> {
        let mut result = Vec::new();
        for item in self.tasks.iter() {
            let (_key, value) = item?;
            let task: Task = rmp_serde::from_slice(&value)?;
            result.push(task);
        }
        Ok(result)
    }

    pub fn list_open(&self) -> AppResult<Vec<Task>> {
        Ok(self.list_all()?.into_iter().filter(|t| !t.is_done).collect())
    }

    pub fn any_in_category(&self, category_id: u64) -> AppResult<bool> {
        for item in self.tasks.iter() {
            let (_key, value) = item?;
            let task: Task = rmp_serde::from_slice(&value)?;
            if task.category_id == category_id {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn count(&self) -> usize {
        self.tasks.len()
    }

    pub fn flush(&self) -> AppResult<()> {
        self.tasks.flush()?;
        Ok(())
    }
}
