//! Queue wiring shared by integration tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use genqueue::{
    artifact::{
        adapters::memory::{InMemoryArtifactStorage, StaticArtifactSource},
        ports::{ArtifactSource, ArtifactStorage},
        services::{MaterializerSettings, ResultMaterializer},
    },
    generation::{
        adapters::ScriptedGenerationApi, domain::PollPolicy, ports::GenerationApi,
        services::GenerationClient,
    },
    prompt::adapters::TemplatePromptComposer,
    queue::{
        adapters::memory::InMemoryTaskStore,
        domain::{
            GenerationTask, PersistedTaskData, QueueDepth, RetryPolicy, TaskId, TaskPayload,
            TaskStatus,
        },
        ports::{ContinuationScheduler, TaskStore},
        services::{ContinuationTrigger, ProcessingPipeline, QueueEntryPoint, TaskProcessor},
    },
};
use mockable::DefaultClock;
use serde_json::json;

/// Output location every scripted job finishes with.
pub const OUTPUT_URL: &str = "https://cdn.test/generated/out-1.png";

/// Public URL prefix of the in-memory artifact storage.
pub const STORAGE_BASE: &str = "https://storage.test";

/// Bytes served at [`OUTPUT_URL`].
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nintegration";

/// Status checks per job used by the rig.
pub const POLL_ATTEMPTS: u32 = 6;

/// Processor type wired by [`QueueRig`].
pub type RigProcessor = TaskProcessor<InMemoryTaskStore, DefaultClock>;

/// Entry point type wired by [`QueueRig`].
pub type RigEntryPoint<S> = QueueEntryPoint<InMemoryTaskStore, DefaultClock, S>;

/// In-memory queue with scripted generation and in-memory artifact storage.
#[derive(Clone)]
pub struct QueueRig {
    pub store: Arc<InMemoryTaskStore>,
    pub api: ScriptedGenerationApi,
    pub storage: InMemoryArtifactStorage,
    pub policy: RetryPolicy,
    pub max_depth: QueueDepth,
    pub poll_interval: Duration,
}

impl QueueRig {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryTaskStore::new()),
            api: ScriptedGenerationApi::new(),
            storage: InMemoryArtifactStorage::new(STORAGE_BASE),
            policy: RetryPolicy::default(),
            max_depth: QueueDepth::DEFAULT_LIMIT,
            poll_interval: Duration::from_millis(1),
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = QueueDepth::new(max_depth);
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn processor(&self) -> RigProcessor {
        let source: Arc<dyn ArtifactSource> = Arc::new(
            StaticArtifactSource::new().with_artifact(OUTPUT_URL, PNG_BYTES, Some("image/png")),
        );
        let storage: Arc<dyn ArtifactStorage> = Arc::new(self.storage.clone());
        let api: Arc<dyn GenerationApi> = Arc::new(self.api.clone());
        let poll = PollPolicy::new(POLL_ATTEMPTS, self.poll_interval)
            .expect("valid poll policy");
        let pipeline = ProcessingPipeline {
            composer: Arc::new(TemplatePromptComposer::default()),
            generation: GenerationClient::new(api, poll, 1),
            materializer: ResultMaterializer::new(
                source,
                storage,
                Arc::new(DefaultClock),
                MaterializerSettings::default(),
            ),
        };
        TaskProcessor::new(
            Arc::clone(&self.store),
            Arc::new(DefaultClock),
            self.policy,
            pipeline,
        )
    }

    pub fn entry_point<S>(&self, scheduler: Arc<S>) -> RigEntryPoint<S>
    where
        S: ContinuationScheduler + 'static,
    {
        let trigger = ContinuationTrigger::new(Arc::clone(&self.store), scheduler, self.max_depth);
        QueueEntryPoint::new(self.processor(), trigger)
    }

    /// Enqueues a pending task and returns its identifier.
    pub async fn enqueue(&self, name: &str) -> TaskId {
        let payload = TaskPayload::new()
            .with_name(name)
            .with_category("Trail")
            .with_attribute("city", "Keswick");
        self.store.enqueue(&payload).await.expect("enqueue task")
    }

    /// Inserts a task in an arbitrary lifecycle state.
    pub async fn insert(
        &self,
        id: i64,
        name: &str,
        status: TaskStatus,
        retry_count: u32,
        started_at: Option<DateTime<Utc>>,
    ) -> TaskId {
        let task_id = TaskId::new(id).expect("valid task id");
        let task = GenerationTask::from_persisted(PersistedTaskData {
            id: task_id,
            status,
            retry_count,
            error_message: None,
            generation_started_at: started_at,
            generation_prompt: None,
            result_reference: None,
            artifact_generated: false,
            payload: TaskPayload::new().with_name(name),
        });
        self.store.insert(&task).await.expect("insert task");
        task_id
    }

    pub async fn task(&self, id: TaskId) -> GenerationTask {
        self.store
            .find_by_id(id)
            .await
            .expect("lookup should succeed")
            .expect("task should exist")
    }

    /// Scripts one job that succeeds on its first status check.
    pub fn script_success(&self, job: &str) {
        self.api.push_job(job);
        self.api
            .push_status_data(json!({"status": 1, "resultImageUrl": OUTPUT_URL}));
    }

    /// Scripts one job that is still running on the first check and reports
    /// success through the flag on the second.
    pub fn script_success_on_second_check(&self, job: &str) {
        self.api.push_job(job);
        self.api.push_status_data(json!({"status": 0, "successFlag": 0}));
        self.api
            .push_status_data(json!({"successFlag": 1, "resultImageUrl": OUTPUT_URL}));
    }
}

impl Default for QueueRig {
    fn default() -> Self {
        Self::new()
    }
}
