use std::path::Path;

use sled::Db;

use crate::{error::AppResult, models::Category};

pub struct CategoryStorage {
    db: Db,
    categories: sled::Tree,
}

impl CategoryStorage {
    /// Open or create a new category storage in the given path
    pub fn open<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let db = sled::open(path)?;
        let categories = db.open_tree("categories")?;

        Ok(Self { db, categories })
    }

    fn make_key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    /// Store several categories in one atomic batch, assigning ids
    pub fn insert_many(&self, categories: &mut [Category]) -> AppResult<()> {
        let mut batch = sled::Batch::default();
        for category in categories.iter_mut() {
            category.id = self.db.generate_id()? + 1;
            let bytes = rmp_serde::to_vec_named(&*category)?;
            batch.insert(Self::make_key(category.id).to_vec(), bytes);
        }
        self.categories.apply_batch(batch)?;
        self.categories.flush()?;
        Ok(())
    }

    pub fn get(&self, id: u64) -> AppResult<Option<Category>> {
        if let Some(value) = self.categories.get(Self::make_key(id))? {
            Ok(Some(rmp_serde::from_slice(&value)?))
        } else {
            Ok(None)
        }
    }

    pub fn find_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        Ok(self.list_all()?.into_iter().find(|c| c.name == name))
    }

    pub fn delete(&self, id: u64) -> AppResult<Option<Category>> {
        let removed = match self.categories.remove(Self::make_key(id))? {
            Some(value) => Some(rmp_serde::from_slice(&value)?),
            None => None,
        };
        self.categories.flush()?;
        Ok(removed)
    }

    pub fn list_all(&self) -> AppResult<Vec<Category>> {
        let mut result = Vec::new();
        for item in self.categories.iter() {
            let (_key, value) = item?;
            let category: Category = rmp_serde::from_slice(&value)?;
            result.push(category);
        }
        Ok(result)
    }

    pub fn count(&self) -> usize {
        self.categories.len()
    }
}
