//! `PostgreSQL` adapters for generation task persistence.

mod models;
mod schema;
mod store;

pub use store::{PostgresTaskStore, QueuePgPool};
