//! `PostgreSQL` task store implementation.

use super::{
    models::{NewTaskRow, TaskIdRow, TaskRow},
    schema::generation_tasks,
};
use crate::queue::{
    domain::{
        FailureDisposition, FailureRecord, GenerationTask, PersistedTaskData, RetryPolicy,
        STALLED_TASK_REASON, TaskClaim, TaskId, TaskPayload, TaskStatus,
    },
    ports::{ClaimOutcome, TaskStore, TaskStoreError, TaskStoreResult, ensure_disposition},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use mockable::Clock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// `PostgreSQL` connection pool type used by queue adapters.
pub type QueuePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task store.
#[derive(Clone)]
pub struct PostgresTaskStore<C>
where
    C: Clock + Send + Sync,
{
    pool: QueuePgPool,
    clock: Arc<C>,
}

impl<C> PostgresTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new store from a `PostgreSQL` connection pool.
    ///
    /// `clock` stamps the creation time of enqueued tasks.
    #[must_use]
    pub const fn new(pool: QueuePgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

#[async_trait]
impl<C> TaskStore for PostgresTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn insert(&self, task: &GenerationTask) -> TaskStoreResult<()> {
        let task_id = task.id();
        let new_row = to_new_row(task, self.clock.utc())?;

        self.run_blocking(move |connection| {
            diesel::insert_into(generation_tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskStoreError::DuplicateTask(task_id)
                    }
                    _ => TaskStoreError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn enqueue(&self, payload: &TaskPayload) -> TaskStoreResult<TaskId> {
        let new_row = payload_row(payload, self.clock.utc())?;

        self.run_blocking(move |connection| {
            let id = diesel::insert_into(generation_tasks::table)
                .values(&new_row)
                .returning(generation_tasks::id)
                .get_result::<i64>(connection)
                .map_err(TaskStoreError::persistence)?;
            TaskId::new(id).map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<GenerationTask>> {
        self.run_blocking(move |connection| {
            let row = generation_tasks::table
                .filter(generation_tasks::id.eq(id.value()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn select_next_eligible(
        &self,
        policy: RetryPolicy,
    ) -> TaskStoreResult<Option<GenerationTask>> {
        let max_retries = to_db_count(policy.max_retries())?;
        self.run_blocking(move |connection| {
            let row = select_next_eligible_row(connection, max_retries)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn claim(&self, claim: &TaskClaim) -> TaskStoreResult<ClaimOutcome> {
        let task_id = claim.task_id().value();
        let expected_status = claim.expected_status().as_str();
        let expected_retry_count = to_db_count(claim.expected_retry_count())?;
        let retry_count = to_db_count(claim.retry_count())?;
        let started_at = claim.started_at();

        self.run_blocking(move |connection| {
            let row = diesel::update(
                generation_tasks::table
                    .filter(generation_tasks::id.eq(task_id))
                    .filter(generation_tasks::status.eq(expected_status))
                    .filter(generation_tasks::retry_count.eq(expected_retry_count)),
            )
            .set((
                generation_tasks::status.eq(TaskStatus::Processing.as_str()),
                generation_tasks::generation_started_at.eq(Some(started_at)),
                generation_tasks::error_message.eq(None::<String>),
                generation_tasks::retry_count.eq(retry_count),
            ))
            .returning(TaskRow::as_returning())
            .get_result::<TaskRow>(connection)
            .optional()
            .map_err(TaskStoreError::persistence)?;

            match row {
                Some(claimed) => Ok(ClaimOutcome::Claimed(row_to_task(claimed)?)),
                None => Ok(ClaimOutcome::Lost),
            }
        })
        .await
    }

    async fn record_prompt(&self, id: TaskId, prompt: &str) -> TaskStoreResult<()> {
        let instruction = prompt.to_owned();
        self.run_blocking(move |connection| {
            let updated = diesel::update(generation_tasks::table.find(id.value()))
                .set(generation_tasks::generation_prompt.eq(Some(instruction)))
                .execute(connection)
                .map_err(TaskStoreError::persistence)?;
            ensure_updated(id, updated)
        })
        .await
    }

    async fn mark_completed(&self, id: TaskId, reference: &str) -> TaskStoreResult<()> {
        let public_reference = reference.to_owned();
        self.run_blocking(move |connection| {
            let updated = diesel::update(generation_tasks::table.find(id.value()))
                .set((
                    generation_tasks::status.eq(TaskStatus::Completed.as_str()),
                    generation_tasks::result_reference.eq(Some(public_reference)),
                    generation_tasks::artifact_generated.eq(true),
                ))
                .execute(connection)
                .map_err(TaskStoreError::persistence)?;
            ensure_updated(id, updated)
        })
        .await
    }

    async fn mark_retryable_failure(&self, failure: &FailureRecord) -> TaskStoreResult<()> {
        ensure_disposition(failure, FailureDisposition::Retryable)?;
        self.write_failure(failure, TaskStatus::Failed).await
    }

    async fn mark_permanent_failure(&self, failure: &FailureRecord) -> TaskStoreResult<()> {
        ensure_disposition(failure, FailureDisposition::Permanent)?;
        self.write_failure(failure, TaskStatus::PermanentlyFailed)
            .await
    }

    async fn count_eligible_pending(&self) -> TaskStoreResult<u64> {
        self.run_blocking(move |connection| {
            let count = generation_tasks::table
                .filter(generation_tasks::status.eq(TaskStatus::Pending.as_str()))
                .count()
                .get_result::<i64>(connection)
                .map_err(TaskStoreError::persistence)?;
            u64::try_from(count).map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn reclaim_stalled(
        &self,
        cutoff: DateTime<Utc>,
        policy: RetryPolicy,
    ) -> TaskStoreResult<Vec<TaskId>> {
        let max_retries = to_db_count(policy.max_retries())?;
        self.run_blocking(move |connection| reclaim_stalled_rows(connection, cutoff, max_retries))
            .await
    }
}

impl<C> PostgresTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn write_failure(
        &self,
        failure: &FailureRecord,
        status: TaskStatus,
    ) -> TaskStoreResult<()> {
        let id = failure.task_id();
        let retry_count = to_db_count(failure.retry_count())?;
        let message = failure.message().to_owned();

        self.run_blocking(move |connection| {
            let updated = diesel::update(generation_tasks::table.find(id.value()))
                .set((
                    generation_tasks::status.eq(status.as_str()),
                    generation_tasks::retry_count.eq(retry_count),
                    generation_tasks::error_message.eq(Some(message)),
                ))
                .execute(connection)
                .map_err(TaskStoreError::persistence)?;
            ensure_updated(id, updated)
        })
        .await
    }
}

impl<C> std::fmt::Debug for PostgresTaskStore<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresTaskStore").finish_non_exhaustive()
    }
}

fn select_next_eligible_row(
    connection: &mut PgConnection,
    max_retries: i32,
) -> TaskStoreResult<Option<TaskRow>> {
    let query = diesel::sql_query(concat!(
        "SELECT id, status, retry_count, error_message, generation_started_at, ",
        "generation_prompt, result_reference, artifact_generated, name, category, ",
        "attributes, created_at FROM generation_tasks ",
        "WHERE status = 'pending' OR (status = 'failed' AND retry_count < $1) ",
        "ORDER BY CASE WHEN status = 'pending' THEN 0 ELSE 1 END, retry_count, id ",
        "LIMIT 1",
    ))
    .bind::<diesel::sql_types::Int4, _>(max_retries);

    query
        .get_result::<TaskRow>(connection)
        .optional()
        .map_err(TaskStoreError::persistence)
}

fn reclaim_stalled_rows(
    connection: &mut PgConnection,
    cutoff: DateTime<Utc>,
    max_retries: i32,
) -> TaskStoreResult<Vec<TaskId>> {
    let query = diesel::sql_query(concat!(
        "UPDATE generation_tasks SET ",
        "status = CASE WHEN retry_count < $1 THEN 'failed' ELSE 'permanently_failed' END, ",
        "error_message = CASE WHEN retry_count < $1 THEN $2 ELSE $3 END ",
        "WHERE status = 'processing' ",
        "AND (generation_started_at IS NULL OR generation_started_at < $4) ",
        "RETURNING id",
    ))
    .bind::<diesel::sql_types::Int4, _>(max_retries)
    .bind::<diesel::sql_types::Text, _>(stalled_message(FailureDisposition::Retryable))
    .bind::<diesel::sql_types::Text, _>(stalled_message(FailureDisposition::Permanent))
    .bind::<diesel::sql_types::Timestamptz, _>(cutoff);

    let mut ids = query
        .get_results::<TaskIdRow>(connection)
        .map_err(TaskStoreError::persistence)?
        .into_iter()
        .map(|row| TaskId::new(row.id).map_err(TaskStoreError::persistence))
        .collect::<TaskStoreResult<Vec<_>>>()?;
    ids.sort_unstable();
    Ok(ids)
}

fn stalled_message(disposition: FailureDisposition) -> String {
    format!("{}: {STALLED_TASK_REASON}", disposition.message_prefix())
}

fn ensure_updated(id: TaskId, updated: usize) -> TaskStoreResult<()> {
    if updated == 0 {
        return Err(TaskStoreError::NotFound(id));
    }
    Ok(())
}

fn to_db_count(value: u32) -> TaskStoreResult<i32> {
    i32::try_from(value).map_err(TaskStoreError::persistence)
}

fn payload_row(payload: &TaskPayload, created_at: DateTime<Utc>) -> TaskStoreResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: None,
        status: TaskStatus::Pending.as_str().to_owned(),
        retry_count: 0,
        error_message: None,
        generation_started_at: None,
        generation_prompt: None,
        result_reference: None,
        artifact_generated: false,
        name: payload.raw_name().map(ToOwned::to_owned),
        category: payload.raw_category().map(ToOwned::to_owned),
        attributes: attributes_value(payload)?,
        created_at,
    })
}

fn to_new_row(task: &GenerationTask, created_at: DateTime<Utc>) -> TaskStoreResult<NewTaskRow> {
    let payload = task.payload();
    Ok(NewTaskRow {
        id: Some(task.id().value()),
        status: task.status().as_str().to_owned(),
        retry_count: to_db_count(task.retry_count())?,
        error_message: task.error_message().map(ToOwned::to_owned),
        generation_started_at: task.generation_started_at(),
        generation_prompt: task.generation_prompt().map(ToOwned::to_owned),
        result_reference: task.result_reference().map(ToOwned::to_owned),
        artifact_generated: task.artifact_generated(),
        name: payload.raw_name().map(ToOwned::to_owned),
        category: payload.raw_category().map(ToOwned::to_owned),
        attributes: attributes_value(payload)?,
        created_at,
    })
}

fn attributes_value(payload: &TaskPayload) -> TaskStoreResult<Value> {
    serde_json::to_value(payload.attributes()).map_err(TaskStoreError::persistence)
}

fn row_to_task(row: TaskRow) -> TaskStoreResult<GenerationTask> {
    let TaskRow {
        id,
        status: persisted_status,
        retry_count,
        error_message,
        generation_started_at,
        generation_prompt,
        result_reference,
        artifact_generated,
        name,
        category,
        attributes: persisted_attributes,
        created_at: _,
    } = row;

    let status =
        TaskStatus::try_from(persisted_status.as_str()).map_err(TaskStoreError::persistence)?;
    let attributes = match persisted_attributes {
        Value::Null => BTreeMap::new(),
        value => serde_json::from_value::<BTreeMap<String, Value>>(value)
            .map_err(TaskStoreError::persistence)?,
    };
    let mut payload = TaskPayload::new().with_attributes(attributes);
    if let Some(task_name) = name {
        payload = payload.with_name(task_name);
    }
    if let Some(task_category) = category {
        payload = payload.with_category(task_category);
    }

    let data = PersistedTaskData {
        id: TaskId::new(id).map_err(TaskStoreError::persistence)?,
        status,
        retry_count: u32::try_from(retry_count).map_err(TaskStoreError::persistence)?,
        error_message,
        generation_started_at,
        generation_prompt,
        result_reference,
        artifact_generated,
        payload,
    };
    Ok(GenerationTask::from_persisted(data))
}
