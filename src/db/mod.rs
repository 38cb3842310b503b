pub mod app_storage;
pub mod categories;
pub mod tasks;
