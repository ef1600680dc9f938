//! Diesel row models for generation task persistence.

use super::schema::generation_tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = generation_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    #[diesel(sql_type = diesel::sql_types::Int8)]
    pub id: i64,
    /// Lifecycle status.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub status: String,
    /// Attempt counter.
    #[diesel(sql_type = diesel::sql_types::Int4)]
    pub retry_count: i32,
    /// Last failure reason.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub error_message: Option<String>,
    /// Timestamp of the latest claim.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Timestamptz>)]
    pub generation_started_at: Option<DateTime<Utc>>,
    /// Instruction built for the latest attempt.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub generation_prompt: Option<String>,
    /// Public reference of the produced artifact.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub result_reference: Option<String>,
    /// Whether the artifact was produced.
    #[diesel(sql_type = diesel::sql_types::Bool)]
    pub artifact_generated: bool,
    /// Human-readable task name.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub name: Option<String>,
    /// Task category.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub category: Option<String>,
    /// Contextual attributes as a JSON object.
    #[diesel(sql_type = diesel::sql_types::Jsonb)]
    pub attributes: Value,
    /// Creation timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
}

/// Insert model for task records.
///
/// A `None` identifier lets the database assign one.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = generation_tasks)]
pub struct NewTaskRow {
    /// Task identifier, or `None` for the column default.
    pub id: Option<i64>,
    /// Lifecycle status.
    pub status: String,
    /// Attempt counter.
    pub retry_count: i32,
    /// Last failure reason.
    pub error_message: Option<String>,
    /// Timestamp of the latest claim.
    pub generation_started_at: Option<DateTime<Utc>>,
    /// Instruction built for the latest attempt.
    pub generation_prompt: Option<String>,
    /// Public reference of the produced artifact.
    pub result_reference: Option<String>,
    /// Whether the artifact was produced.
    pub artifact_generated: bool,
    /// Human-readable task name.
    pub name: Option<String>,
    /// Task category.
    pub category: Option<String>,
    /// Contextual attributes as a JSON object.
    pub attributes: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Identifier-only row returned by bulk updates.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub struct TaskIdRow {
    /// Task identifier.
    #[diesel(sql_type = diesel::sql_types::Int8)]
    pub id: i64,
}
