mod db;
pub mod error;
pub mod models;
mod overview;
mod repo;

pub use crate::db::Database;
pub use crate::repo::Repository;
