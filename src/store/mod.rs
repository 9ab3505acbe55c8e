//! Relational storage: SQLite schema, record types and the async handle the
//! HTTP layer shares.

pub mod db;
pub mod models;

pub use db::{BoardDb, DbHandle};
